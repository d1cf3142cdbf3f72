use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::EventData;
use crate::Result;

/// Delivery half of a buffered sink.
///
/// `encode` turns one record into the bytes the sink ships (and the size the
/// batch ceilings count); `send_batch` delivers one batch of encoded records
/// in enqueue order. Failures are reported, never retried by the caller.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BatchTransport: Send + Sync + 'static {
    fn encode(
        &self,
        data: &EventData,
    ) -> Result<Vec<u8>> {
        data.to_json_vec()
    }

    async fn send_batch(
        &self,
        batch: Vec<Vec<u8>>,
    ) -> Result<()>;
}
