use std::sync::Arc;

use async_trait::async_trait;

use super::clients::EventHubClient;
use crate::BatchTransport;
use crate::Result;

/// Publishes each batch of JSON records as one event hub batch.
///
/// The byte ceiling of the owning dispatcher keeps batches under the hub's
/// message size limit.
pub struct EventHubTransport {
    client: Arc<dyn EventHubClient>,
}

impl EventHubTransport {
    pub fn new(client: Arc<dyn EventHubClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BatchTransport for EventHubTransport {
    async fn send_batch(
        &self,
        batch: Vec<Vec<u8>>,
    ) -> Result<()> {
        self.client.send_batch(batch).await
    }
}
