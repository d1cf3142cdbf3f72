use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Map;
use serde_json::Value;
use tracing::warn;

use super::EventSink;
use crate::Event;
use crate::EventData;
use crate::Result;

/// Writes every record as one JSON line.
///
/// With a namespace, records are wrapped as `{"<namespace>": record}` so
/// log collectors can file them under one key.
pub struct StdoutSink {
    namespace: String,
    out: Mutex<Box<dyn Write + Send>>,
}

impl StdoutSink {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_writer(namespace, Box::new(std::io::stdout()))
    }

    pub fn with_writer(
        namespace: impl Into<String>,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            out: Mutex::new(out),
        }
    }

    fn render(
        &self,
        data: &EventData,
    ) -> Result<Vec<u8>> {
        let mut line = if self.namespace.is_empty() {
            serde_json::to_vec(data)?
        } else {
            let mut wrapped = Map::new();
            wrapped.insert(self.namespace.clone(), serde_json::to_value(data)?);
            serde_json::to_vec(&Value::Object(wrapped))?
        };
        line.push(b'\n');
        Ok(line)
    }

    fn write_record(
        &self,
        data: &EventData,
    ) -> Result<()> {
        let line = self.render(data)?;
        let mut out = self.out.lock();
        out.write_all(&line)?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl EventSink for StdoutSink {
    async fn update_events(
        &self,
        new: Arc<Event>,
        old: Option<Arc<Event>>,
    ) {
        if let Err(e) = self.write_record(&EventData::new(new, old)) {
            warn!("failed to write event to stdout: {}", e);
        }
    }
}
