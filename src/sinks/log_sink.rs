use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use tracing::warn;

use super::EventSink;
use crate::Event;
use crate::EventData;

/// Writes every record to the process log at INFO
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for LogSink {
    async fn update_events(
        &self,
        new: Arc<Event>,
        old: Option<Arc<Event>>,
    ) {
        let data = EventData::new(new, old);
        match serde_json::to_string(&data) {
            Ok(json) => info!(target: "eventrouter::sink", "{}", json),
            Err(e) => warn!("failed to serialize event: {}", e),
        }
    }
}
