use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::interval;
use tokio::time::Interval;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use super::BatchBuffer;
use super::BatchTransport;
use super::DispatchStats;
use super::DispatcherState;
use crate::metrics::DELIVERED_EVENTS;
use crate::metrics::DROPPED_EVENTS;
use crate::metrics::FAILED_BATCHES;
use crate::DispatchConfig;
use crate::Event;
use crate::EventData;
use crate::EventSink;
use crate::OverflowPolicy;
use crate::Result;
use crate::SinkError;

/// Producer half of a buffered sink.
///
/// Owns the sending side of a bounded FIFO. Records are accepted in order
/// and never reordered; when the queue is full the overflow policy decides
/// between dropping the newest record and waiting a bounded time.
pub struct BufferedDispatcher {
    name: String,
    sender: mpsc::Sender<EventData>,
    overflow: OverflowPolicy,
    block_timeout: Duration,
    stats: Arc<DispatchStats>,
}

/// Consumer half of a buffered sink: the only reader of the queue and the
/// only owner of the pending batch.
pub struct DrainWorker {
    name: String,
    receiver: mpsc::Receiver<EventData>,
    transport: Arc<dyn BatchTransport>,
    batch: BatchBuffer,
    capacity: usize,
    stats: Arc<DispatchStats>,
}

impl BufferedDispatcher {
    pub fn new(
        name: impl Into<String>,
        transport: Arc<dyn BatchTransport>,
        config: &DispatchConfig,
    ) -> (Self, DrainWorker) {
        let name = name.into();
        let capacity = config.buffer_size.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let stats = Arc::new(DispatchStats::default());

        let dispatcher = Self {
            name: name.clone(),
            sender,
            overflow: config.overflow,
            block_timeout: config.block_timeout(),
            stats: stats.clone(),
        };
        let worker = DrainWorker {
            name,
            receiver,
            transport,
            batch: BatchBuffer::new(
                config.max_batch_items,
                config.max_batch_bytes,
                config.flush_interval(),
            ),
            capacity,
            stats,
        };
        (dispatcher, worker)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> Arc<DispatchStats> {
        self.stats.clone()
    }

    /// Hands a record to the queue, reporting why it was not accepted.
    pub async fn try_enqueue(
        &self,
        data: EventData,
    ) -> std::result::Result<(), SinkError> {
        let result = match self.overflow {
            OverflowPolicy::Drop => self.sender.try_send(data).map_err(|e| match e {
                TrySendError::Full(_) => SinkError::QueueFull(self.name.clone()),
                TrySendError::Closed(_) => SinkError::QueueClosed(self.name.clone()),
            }),
            OverflowPolicy::Block => {
                self.sender.send_timeout(data, self.block_timeout).await.map_err(|e| match e {
                    SendTimeoutError::Timeout(_) => SinkError::EnqueueTimeout {
                        sink: self.name.clone(),
                        duration: self.block_timeout,
                    },
                    SendTimeoutError::Closed(_) => SinkError::QueueClosed(self.name.clone()),
                })
            }
        };

        if result.is_ok() {
            self.stats.record_enqueued();
        }
        result
    }

    /// Enqueues a record; a rejected record is logged and counted as dropped.
    ///
    /// Under the drop policy this never suspends.
    pub async fn enqueue(
        &self,
        data: EventData,
    ) -> bool {
        match self.try_enqueue(data).await {
            Ok(()) => true,
            Err(e) => {
                self.stats.record_dropped();
                DROPPED_EVENTS.with_label_values(&[self.name.as_str()]).inc();
                warn!(sink = %self.name, "dropping event: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl EventSink for BufferedDispatcher {
    async fn update_events(
        &self,
        new: Arc<Event>,
        old: Option<Arc<Event>>,
    ) {
        self.enqueue(EventData::new(new, old)).await;
    }
}

impl DrainWorker {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> Arc<DispatchStats> {
        self.stats.clone()
    }

    /// Batching window; zero flushes whenever the queue runs dry
    pub fn window(&self) -> Duration {
        self.batch.window()
    }

    /// Drains the queue into batched transport calls until `stop` fires.
    ///
    /// Each cycle takes the first record, then everything already queued,
    /// then flushes unless a time window holds the batch. On stop the
    /// queue is closed, whatever is still queued is pulled without waiting,
    /// and a final flush is made.
    pub async fn run(
        mut self,
        stop: CancellationToken,
    ) -> Result<()> {
        let window = self.batch.window();
        let mut ticker = if window.is_zero() {
            None
        } else {
            let mut ticker = interval(window);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(ticker)
        };

        info!(sink = %self.name, window_ms = window.as_millis() as u64, "drain worker started");
        self.stats.set_state(DispatcherState::Running);

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    debug!(sink = %self.name, "stop requested");
                    break;
                }
                item = self.receiver.recv() => {
                    let Some(data) = item else {
                        debug!(sink = %self.name, "all producers gone");
                        break;
                    };

                    self.stats.set_state(DispatcherState::Draining);
                    self.accept(data).await;
                    self.drain_ready().await;
                    if window.is_zero() || self.batch.should_flush() {
                        self.flush().await;
                    }
                    self.stats.set_state(DispatcherState::Running);
                }
                _ = tick(&mut ticker) => {
                    if self.batch.should_flush() {
                        self.flush().await;
                    }
                }
            }
        }

        self.stats.set_state(DispatcherState::Stopping);
        self.receiver.close();
        while let Ok(data) = self.receiver.try_recv() {
            self.accept(data).await;
        }
        self.flush().await;

        self.stats.set_state(DispatcherState::Stopped);
        info!(sink = %self.name, "drain worker stopped");
        Ok(())
    }

    /// Pulls what is already queued, at most one queue's worth per cycle
    async fn drain_ready(&mut self) {
        for _ in 0..self.capacity {
            match self.receiver.try_recv() {
                Ok(data) => self.accept(data).await,
                Err(_) => break,
            }
        }
    }

    async fn accept(
        &mut self,
        data: EventData,
    ) {
        let item = match self.transport.encode(&data) {
            Ok(item) => item,
            Err(e) => {
                self.stats.record_encode_failure();
                error!(sink = %self.name, uid = %data.event.metadata.uid, "failed to encode event: {}", e);
                return;
            }
        };

        if self.batch.would_overflow(item.len()) {
            self.flush().await;
        }
        if self.batch.push(item).is_some() {
            self.flush().await;
        }
    }

    #[instrument(skip(self), fields(sink = %self.name))]
    async fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }

        let previous = self.stats.state();
        self.stats.set_state(DispatcherState::Flushing);

        let batch_bytes = self.batch.bytes();
        let batch = self.batch.take();
        let batch_size = batch.len();
        match self.transport.send_batch(batch).await {
            Ok(()) => {
                debug!(batch_size, batch_bytes, "batch delivered");
                self.stats.record_delivered(batch_size);
                DELIVERED_EVENTS.with_label_values(&[self.name.as_str()]).inc_by(batch_size as u64);
            }
            Err(e) => {
                error!(batch_size, batch_bytes, "failed to deliver batch: {}", e);
                self.stats.record_failed_batch();
                FAILED_BATCHES.with_label_values(&[self.name.as_str()]).inc();
            }
        }

        self.stats.set_state(previous);
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
