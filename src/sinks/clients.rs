//! Client seams of the sinks whose network clients are supplied by the
//! embedding process.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;

use crate::Result;

/// Message broker producer (one message per record)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BrokerProducer: Send + Sync + 'static {
    async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: Vec<u8>,
    ) -> Result<()>;
}

/// Blob storage upload of one object
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectUploader: Send + Sync + 'static {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<()>;
}

/// Event hub batch publisher
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventHubClient: Send + Sync + 'static {
    async fn send_batch(
        &self,
        events: Vec<Vec<u8>>,
    ) -> Result<()>;
}

/// Document store ingestion
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn add_documents(
        &self,
        workspace: &str,
        collection: &str,
        documents: Vec<Value>,
    ) -> Result<()>;
}
