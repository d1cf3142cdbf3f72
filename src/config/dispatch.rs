use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// What to do with a record when the sink's queue is full
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Discard the incoming record and return immediately
    #[default]
    Drop,
    /// Wait for space, at most `block_timeout_ms`
    Block,
}

/// Queue and batching parameters of one buffered sink
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Queue capacity in records
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    #[serde(default)]
    pub overflow: OverflowPolicy,

    /// Upper bound of a blocked enqueue (block policy only)
    #[serde(default = "default_block_timeout_ms")]
    pub block_timeout_ms: u64,

    /// Maximum records per transport call (0 = unlimited)
    #[serde(default)]
    pub max_batch_items: usize,

    /// Maximum encoded bytes per transport call (0 = unlimited)
    #[serde(default)]
    pub max_batch_bytes: usize,

    /// Hold batches until this much time passed since the last flush
    /// (0 = flush as soon as the queue is momentarily empty)
    #[serde(default)]
    pub flush_interval_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            overflow: OverflowPolicy::default(),
            block_timeout_ms: default_block_timeout_ms(),
            max_batch_items: 0,
            max_batch_bytes: 0,
            flush_interval_ms: 0,
        }
    }
}

impl DispatchConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn block_timeout(&self) -> Duration {
        Duration::from_millis(self.block_timeout_ms)
    }

    /// Validates dispatch parameters
    /// # Errors
    /// Returns `Error::InvalidConfig` when:
    /// - the queue has no capacity
    /// - the block policy is selected without a timeout
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::InvalidConfig("dispatch buffer_size must be greater than 0".into()));
        }

        if self.overflow == OverflowPolicy::Block && self.block_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "dispatch block_timeout_ms must be greater than 0 with the block overflow policy".into(),
            ));
        }

        Ok(())
    }
}

fn default_buffer_size() -> usize {
    1500
}

fn default_block_timeout_ms() -> u64 {
    1000
}
