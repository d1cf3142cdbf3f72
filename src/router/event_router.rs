use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::EventHandler;
use crate::classify_deleted;
use crate::metrics;
use crate::to_event_pointer;
use crate::utils::async_task::spawn_task;
use crate::DrainWorker;
use crate::Event;
use crate::EventSink;
use crate::ManufacturedSink;
use crate::Result;
use crate::WatchPayload;

/// Routes cluster events to the configured sinks.
///
/// Every sink receives the same immutable event for each accepted
/// notification. Buffered sinks hand their drain workers over at
/// construction; [`EventRouter::run`] owns them from then on.
pub struct EventRouter {
    sinks: Vec<(String, Arc<dyn EventSink>)>,
    workers: Mutex<Vec<DrainWorker>>,
    enable_metrics: bool,
}

impl EventRouter {
    pub fn new(
        sinks: Vec<ManufacturedSink>,
        enable_metrics: bool,
    ) -> Self {
        if enable_metrics {
            metrics::init();
        }

        let mut routed = Vec::with_capacity(sinks.len());
        let mut workers = Vec::new();
        for sink in sinks {
            if let Some(worker) = sink.worker {
                workers.push(worker);
            }
            routed.push((sink.name, sink.sink));
        }

        info!(sinks = routed.len(), workers = workers.len(), "event router created");
        Self {
            sinks: routed,
            workers: Mutex::new(workers),
            enable_metrics,
        }
    }

    /// Router over sinks that need no drain worker
    pub fn with_sinks(
        sinks: Vec<(String, Arc<dyn EventSink>)>,
        enable_metrics: bool,
    ) -> Self {
        if enable_metrics {
            metrics::init();
        }
        Self {
            sinks,
            workers: Mutex::new(Vec::new()),
            enable_metrics,
        }
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Runs every drain worker until `stop` fires and all of them finished
    /// their final flush.
    ///
    /// Workers can only be run once; a second call just waits for `stop`.
    pub async fn run(
        &self,
        stop: CancellationToken,
    ) -> Result<()> {
        let workers = std::mem::take(&mut *self.workers.lock());
        if workers.is_empty() {
            debug!("no drain workers, waiting for shutdown");
            stop.cancelled().await;
            return Ok(());
        }

        let mut handles = Vec::with_capacity(workers.len());
        for worker in workers {
            let name = format!("drain-{}", worker.name());
            let token = stop.clone();
            spawn_task(&name, move || worker.run(token), Some(&mut handles));
        }

        for result in join_all(handles).await {
            result?;
        }
        info!("all drain workers stopped");
        Ok(())
    }

    async fn forward(
        &self,
        new: Arc<Event>,
        old: Option<Arc<Event>>,
    ) {
        if self.enable_metrics {
            metrics::record_event(&new);
        }

        join_all(
            self.sinks
                .iter()
                .map(|(_, sink)| sink.update_events(new.clone(), old.clone())),
        )
        .await;
    }
}

#[async_trait]
impl EventHandler for EventRouter {
    async fn on_add(
        &self,
        payload: &WatchPayload,
    ) {
        let event = match to_event_pointer(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!("dropping added notification: {}", e);
                return;
            }
        };
        trace!(uid = %event.metadata.uid, reason = %event.reason, warning = event.is_warning(), "event added");
        self.forward(event, None).await;
    }

    async fn on_update(
        &self,
        old: &WatchPayload,
        new: &WatchPayload,
    ) {
        let event = match to_event_pointer(new) {
            Ok(event) => event,
            Err(e) => {
                warn!("dropping updated notification: {}", e);
                return;
            }
        };
        let old_event = match to_event_pointer(old) {
            Ok(old_event) => Some(old_event),
            Err(e) => {
                debug!(uid = %event.metadata.uid, "prior version unusable, routing as new: {}", e);
                None
            }
        };
        trace!(uid = %event.metadata.uid, reason = %event.reason, warning = event.is_warning(), "event updated");
        self.forward(event, old_event).await;
    }

    /// Deletions are logged, never forwarded: sinks only see events while
    /// they are live.
    async fn on_delete(
        &self,
        payload: &WatchPayload,
    ) {
        match classify_deleted(payload) {
            Ok(deleted) => match deleted.tombstone_key {
                Some(key) => debug!(
                    uid = %deleted.event.metadata.uid,
                    tombstone = %key,
                    "event deleted while the watch cache was stale"
                ),
                None => debug!(
                    uid = %deleted.event.metadata.uid,
                    reason = %deleted.event.reason,
                    "event deleted"
                ),
            },
            Err(e) => warn!("ignoring deleted notification: {}", e),
        }
    }
}
