use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::clients::DocumentStore;
use crate::BatchTransport;
use crate::Result;
use crate::RocksetSinkConfig;

/// Adds each batch as JSON documents to a document store collection
pub struct RocksetTransport {
    store: Arc<dyn DocumentStore>,
    workspace: String,
    collection: String,
}

impl RocksetTransport {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        config: &RocksetSinkConfig,
    ) -> Self {
        Self {
            store,
            workspace: config.workspace.clone(),
            collection: config.collection.clone(),
        }
    }
}

#[async_trait]
impl BatchTransport for RocksetTransport {
    async fn send_batch(
        &self,
        batch: Vec<Vec<u8>>,
    ) -> Result<()> {
        let documents = batch
            .iter()
            .map(|item| serde_json::from_slice::<Value>(item))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.store.add_documents(&self.workspace, &self.collection, documents).await
    }
}
