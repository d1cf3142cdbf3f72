use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

/// Encoded records waiting for the next transport call.
///
/// Bounded by an item count and a byte total (0 disables either bound) and
/// optionally held back until `window` passed since the last flush.
pub struct BatchBuffer {
    pub(super) max_items: usize,
    pub(super) max_bytes: usize,
    pub(super) window: Duration,
    pub(super) items: Vec<Vec<u8>>,
    pub(super) bytes: usize,
    pub(super) last_flush: Instant,
}

impl BatchBuffer {
    pub fn new(
        max_items: usize,
        max_bytes: usize,
        window: Duration,
    ) -> Self {
        Self {
            max_items,
            max_bytes,
            window,
            items: Vec::new(),
            bytes: 0,
            last_flush: Instant::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether appending an item of `item_len` bytes would cross a ceiling.
    ///
    /// An empty batch never overflows, so an oversize item still goes out
    /// on its own.
    pub fn would_overflow(
        &self,
        item_len: usize,
    ) -> bool {
        if self.items.is_empty() {
            return false;
        }
        (self.max_items > 0 && self.items.len() + 1 > self.max_items)
            || (self.max_bytes > 0 && self.bytes + item_len > self.max_bytes)
    }

    /// Appends an item; returns the batch length once a ceiling is reached
    pub fn push(
        &mut self,
        item: Vec<u8>,
    ) -> Option<usize> {
        self.bytes += item.len();
        self.items.push(item);
        trace!(
            "BatchBuffer::push, len={}, bytes={}, max_items={}, max_bytes={}",
            self.items.len(),
            self.bytes,
            self.max_items,
            self.max_bytes
        );
        if self.is_full() {
            Some(self.items.len())
        } else {
            None
        }
    }

    pub fn is_full(&self) -> bool {
        (self.max_items > 0 && self.items.len() >= self.max_items)
            || (self.max_bytes > 0 && self.bytes >= self.max_bytes)
    }

    /// Pending items whose window has elapsed
    pub fn should_flush(&self) -> bool {
        !self.items.is_empty() && self.last_flush.elapsed() >= self.window
    }

    pub fn take(&mut self) -> Vec<Vec<u8>> {
        self.last_flush = Instant::now();
        self.bytes = 0;
        std::mem::take(&mut self.items)
    }
}
