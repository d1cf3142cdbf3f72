use std::borrow::Cow;
use std::sync::Arc;

use super::Event;

/// Display name of a shared reference to a concrete event
pub const EVENT_POINTER_TYPE: &str = "*v1.Event";
pub const EVENT_VALUE_TYPE: &str = "v1.Event";
pub const TOMBSTONE_POINTER_TYPE: &str = "*cache.DeletedFinalStateUnknown";
pub const TOMBSTONE_VALUE_TYPE: &str = "cache.DeletedFinalStateUnknown";
pub const NIL_TYPE: &str = "<nil>";

/// Tombstone emitted by the watch layer when an object was deleted while
/// its local cache had fallen behind: only the store key and the last known
/// state survive.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedFinalStateUnknown {
    pub key: String,
    pub obj: Box<WatchPayload>,
}

impl Default for DeletedFinalStateUnknown {
    fn default() -> Self {
        Self {
            key: String::new(),
            obj: Box::new(WatchPayload::Nil),
        }
    }
}

/// Raw notification payload handed over by the watch collaborator's adapter.
///
/// Only [`WatchPayload::Event`] is a valid input for building an
/// [`EventData`](super::EventData); every other shape is a classification
/// failure, never a crash.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchPayload {
    /// Shared reference to a concrete event
    Event(Arc<Event>),
    /// Bare event value
    EventValue(Event),
    Tombstone(Arc<DeletedFinalStateUnknown>),
    TombstoneValue(DeletedFinalStateUnknown),
    /// Any unrelated object or primitive, described by its type name
    Other { type_name: String },
    Nil,
}

impl WatchPayload {
    pub fn event(event: Event) -> Self {
        WatchPayload::Event(Arc::new(event))
    }

    pub fn tombstone(
        key: impl Into<String>,
        obj: WatchPayload,
    ) -> Self {
        WatchPayload::Tombstone(Arc::new(DeletedFinalStateUnknown {
            key: key.into(),
            obj: Box::new(obj),
        }))
    }

    pub fn other(type_name: impl Into<String>) -> Self {
        WatchPayload::Other {
            type_name: type_name.into(),
        }
    }

    /// Name of the observed shape, as reported in classification errors
    pub fn type_name(&self) -> Cow<'_, str> {
        match self {
            WatchPayload::Event(_) => Cow::Borrowed(EVENT_POINTER_TYPE),
            WatchPayload::EventValue(_) => Cow::Borrowed(EVENT_VALUE_TYPE),
            WatchPayload::Tombstone(_) => Cow::Borrowed(TOMBSTONE_POINTER_TYPE),
            WatchPayload::TombstoneValue(_) => Cow::Borrowed(TOMBSTONE_VALUE_TYPE),
            WatchPayload::Other { type_name } => Cow::Borrowed(type_name.as_str()),
            WatchPayload::Nil => Cow::Borrowed(NIL_TYPE),
        }
    }
}

impl From<Arc<Event>> for WatchPayload {
    fn from(event: Arc<Event>) -> Self {
        WatchPayload::Event(event)
    }
}
