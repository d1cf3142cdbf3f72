use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::BatchTransport;
use crate::EventData;
use crate::Result;

/// Transport that keeps every batch it was handed
#[derive(Default)]
pub(crate) struct RecordingTransport {
    batches: Mutex<Vec<Vec<Vec<u8>>>>,
    notify: Notify,
}

impl RecordingTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn batches(&self) -> Vec<Vec<Vec<u8>>> {
        self.batches.lock().clone()
    }

    pub(crate) fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().iter().map(Vec::len).collect()
    }

    /// Delivered records decoded back, in delivery order
    pub(crate) fn records(&self) -> Vec<EventData> {
        self.batches
            .lock()
            .iter()
            .flatten()
            .map(|item| serde_json::from_slice(item).expect("recorded item is JSON"))
            .collect()
    }

    /// Reasons of the delivered events, in delivery order
    pub(crate) fn reasons(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.event.reason.clone()).collect()
    }

    /// Waits until at least `count` records were delivered
    pub(crate) async fn wait_for_records(
        &self,
        count: usize,
    ) {
        loop {
            let notified = self.notify.notified();
            if self.batches.lock().iter().map(Vec::len).sum::<usize>() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl BatchTransport for RecordingTransport {
    fn encode(
        &self,
        data: &EventData,
    ) -> Result<Vec<u8>> {
        data.to_json_vec()
    }

    async fn send_batch(
        &self,
        batch: Vec<Vec<u8>>,
    ) -> Result<()> {
        self.batches.lock().push(batch);
        self.notify.notify_waiters();
        Ok(())
    }
}
