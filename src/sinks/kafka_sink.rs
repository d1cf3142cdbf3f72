use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::clients::BrokerProducer;
use crate::BatchTransport;
use crate::EventData;
use crate::Result;
use crate::SinkError;

/// Separates the message key from the payload in an encoded record. JSON
/// text never carries a raw NUL byte.
const KEY_SEPARATOR: u8 = 0;

/// Publishes each record of a batch as one broker message on `topic`.
///
/// Every message of a batch is attempted; the batch fails if any send did.
pub struct KafkaTransport {
    producer: Arc<dyn BrokerProducer>,
    topic: String,
}

impl KafkaTransport {
    pub fn new(
        producer: Arc<dyn BrokerProducer>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }
}

/// Encodes a record as `<uid> NUL <json>`
pub fn keyed_record(data: &EventData) -> Result<Vec<u8>> {
    let key = data.event.metadata.uid.as_bytes();
    let mut record = Vec::with_capacity(key.len() + 1 + 512);
    record.extend_from_slice(key);
    record.push(KEY_SEPARATOR);
    serde_json::to_writer(&mut record, data)?;
    Ok(record)
}

/// Splits an encoded record into message key and payload; a record without
/// a separator is sent unkeyed.
pub fn split_keyed_record(mut record: Vec<u8>) -> (String, Vec<u8>) {
    match record.iter().position(|b| *b == KEY_SEPARATOR) {
        Some(at) => {
            let payload = record.split_off(at + 1);
            record.truncate(at);
            (String::from_utf8_lossy(&record).into_owned(), payload)
        }
        None => (String::new(), record),
    }
}

#[async_trait]
impl BatchTransport for KafkaTransport {
    fn encode(
        &self,
        data: &EventData,
    ) -> Result<Vec<u8>> {
        keyed_record(data)
    }

    async fn send_batch(
        &self,
        batch: Vec<Vec<u8>>,
    ) -> Result<()> {
        let total = batch.len();
        let mut failed = 0;
        let mut last_error = None;

        for record in batch {
            let (key, payload) = split_keyed_record(record);
            if let Err(e) = self.producer.send(&self.topic, &key, payload).await {
                warn!(topic = %self.topic, %key, "failed to publish event: {}", e);
                failed += 1;
                last_error = Some(e);
            }
        }

        match last_error {
            None => Ok(()),
            Some(e) => Err(SinkError::Transport {
                sink: "kafka".to_string(),
                source: format!("{failed} of {total} messages failed, last error: {e}").into(),
            }
            .into()),
        }
    }
}
