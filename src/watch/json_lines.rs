use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::Lines;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::Event;
use crate::EventHandler;
use crate::Result;
use crate::WatchPayload;

/// One line of a watch stream
#[derive(Debug, Deserialize)]
struct WatchLine {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    object: Value,
}

/// Reads watch notifications, one JSON document per line, and drives an
/// [`EventHandler`] with them.
///
/// A local store of the events seen so far supplies the prior version of
/// `MODIFIED` notifications. A `DELETED` event the store never saw is
/// handed over wrapped in a tombstone.
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    store: HashMap<String, Arc<Event>>,
}

impl<R> JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            store: HashMap::new(),
        }
    }

    /// Consumes the feed until EOF or `stop`
    pub async fn run(
        mut self,
        handler: Arc<dyn EventHandler>,
        stop: CancellationToken,
    ) -> Result<()> {
        let mut line_no = 0u64;
        loop {
            let line = tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    debug!("watch feed stopped");
                    return Ok(());
                }
                line = self.lines.next_line() => line?,
            };

            let Some(line) = line else {
                info!(lines = line_no, known_events = self.store.len(), "watch feed reached end of input");
                return Ok(());
            };
            line_no += 1;

            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WatchLine>(&line) {
                Ok(notification) => self.dispatch(handler.as_ref(), notification).await,
                Err(e) => warn!(line = line_no, "skipping malformed watch line: {}", e),
            }
        }
    }

    async fn dispatch(
        &mut self,
        handler: &dyn EventHandler,
        notification: WatchLine,
    ) {
        match notification.kind.as_str() {
            "ADDED" => {
                let payload = to_payload(notification.object);
                self.remember(&payload);
                handler.on_add(&payload).await;
            }
            "MODIFIED" => {
                let payload = to_payload(notification.object);
                let old = match &payload {
                    WatchPayload::Event(event) => self
                        .store
                        .get(&event.store_key())
                        .cloned()
                        .map(WatchPayload::Event)
                        .unwrap_or(WatchPayload::Nil),
                    _ => WatchPayload::Nil,
                };
                self.remember(&payload);
                handler.on_update(&old, &payload).await;
            }
            "DELETED" => {
                let payload = to_payload(notification.object);
                let payload = match payload {
                    WatchPayload::Event(event) => {
                        let key = event.store_key();
                        match self.store.remove(&key) {
                            Some(_) => WatchPayload::Event(event),
                            None => WatchPayload::tombstone(key, WatchPayload::Event(event)),
                        }
                    }
                    other => other,
                };
                handler.on_delete(&payload).await;
            }
            "BOOKMARK" => trace!("watch bookmark"),
            "ERROR" => warn!(status = %notification.object, "watch reported an error"),
            other => warn!("skipping watch notification of unknown type {}", other),
        }
    }

    fn remember(
        &mut self,
        payload: &WatchPayload,
    ) {
        if let WatchPayload::Event(event) = payload {
            self.store.insert(event.store_key(), event.clone());
        }
    }
}

/// Maps a watched object onto the payload shapes the router classifies.
///
/// Core `v1` events decode into [`WatchPayload::Event`]; any other object
/// is described by its Go-style type name (`*v1.Pod`), followed by the API
/// group for non-core groups (`*v1.Event (events.k8s.io)`).
pub fn to_payload(object: Value) -> WatchPayload {
    match object {
        Value::Null => WatchPayload::Nil,
        Value::Object(fields) => {
            let kind = fields.get("kind").and_then(Value::as_str).unwrap_or("Event");
            let api_version = fields.get("apiVersion").and_then(Value::as_str).unwrap_or("v1");
            let type_name = match api_version.split_once('/') {
                Some((group, version)) => format!("*{version}.{kind} ({group})"),
                None => format!("*{api_version}.{kind}"),
            };

            if kind != "Event" || api_version != "v1" {
                return WatchPayload::other(type_name);
            }
            match serde_json::from_value::<Event>(Value::Object(fields)) {
                Ok(event) => WatchPayload::event(event),
                Err(e) => {
                    debug!("event object does not decode: {}", e);
                    WatchPayload::other(format!("{type_name} (undecodable)"))
                }
            }
        }
        Value::Bool(_) => WatchPayload::other("bool"),
        Value::Number(_) => WatchPayload::other("float64"),
        Value::String(_) => WatchPayload::other("string"),
        Value::Array(_) => WatchPayload::other("[]interface {}"),
    }
}
