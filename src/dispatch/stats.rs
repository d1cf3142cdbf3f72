use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

/// Lifecycle of a dispatcher's drain worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatcherState {
    /// Built, worker not started
    Idle = 0,
    /// Waiting for records
    Running = 1,
    /// Pulling queued records into the batch
    Draining = 2,
    /// Transport call in progress
    Flushing = 3,
    /// Stop requested, final pass in progress
    Stopping = 4,
    Stopped = 5,
}

impl DispatcherState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => DispatcherState::Idle,
            1 => DispatcherState::Running,
            2 => DispatcherState::Draining,
            3 => DispatcherState::Flushing,
            4 => DispatcherState::Stopping,
            _ => DispatcherState::Stopped,
        }
    }
}

/// Counters shared between a dispatcher and its drain worker
#[derive(Debug)]
pub struct DispatchStats {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed_batches: AtomicU64,
    encode_failures: AtomicU64,
    state: AtomicU8,
}

impl Default for DispatchStats {
    fn default() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed_batches: AtomicU64::new(0),
            encode_failures: AtomicU64::new(0),
            state: AtomicU8::new(DispatcherState::Idle as u8),
        }
    }
}

impl DispatchStats {
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Acquire)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Acquire)
    }

    /// Records handed to successful transport calls
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Acquire)
    }

    pub fn failed_batches(&self) -> u64 {
        self.failed_batches.load(Ordering::Acquire)
    }

    pub fn encode_failures(&self) -> u64 {
        self.encode_failures.load(Ordering::Acquire)
    }

    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(super) fn set_state(
        &self,
        state: DispatcherState,
    ) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(super) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::AcqRel);
    }

    pub(super) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::AcqRel);
    }

    pub(super) fn record_delivered(
        &self,
        count: usize,
    ) {
        self.delivered.fetch_add(count as u64, Ordering::AcqRel);
    }

    pub(super) fn record_failed_batch(&self) {
        self.failed_batches.fetch_add(1, Ordering::AcqRel);
    }

    pub(super) fn record_encode_failure(&self) {
        self.encode_failures.fetch_add(1, Ordering::AcqRel);
    }
}
