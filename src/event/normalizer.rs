use std::sync::Arc;

use super::DeletedFinalStateUnknown;
use super::Event;
use super::WatchPayload;
use crate::NormalizeError;

/// Event recovered from a delete notification
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedEvent {
    pub event: Arc<Event>,
    /// Store key of the tombstone the event was unwrapped from, if any
    pub tombstone_key: Option<String>,
}

/// Classifies an add/update payload.
///
/// Only a shared reference to a concrete event is accepted; the returned
/// `Arc` is the same allocation the watch layer handed over. Any other shape
/// yields `unexpected type: <type name>`.
pub fn to_event_pointer(payload: &WatchPayload) -> std::result::Result<Arc<Event>, NormalizeError> {
    match payload {
        WatchPayload::Event(event) => Ok(Arc::clone(event)),
        other => Err(NormalizeError::UnexpectedType(other.type_name().into_owned())),
    }
}

/// Classifies a delete payload.
///
/// Unlike [`to_event_pointer`], a tombstone is an expected shape here: the
/// object went away while the watch cache was stale, so the last known state
/// is unwrapped and classified instead.
pub fn classify_deleted(payload: &WatchPayload) -> std::result::Result<DeletedEvent, NormalizeError> {
    match payload {
        WatchPayload::Tombstone(tombstone) => unwrap_tombstone(tombstone),
        WatchPayload::TombstoneValue(tombstone) => unwrap_tombstone(tombstone),
        other => to_event_pointer(other).map(|event| DeletedEvent {
            event,
            tombstone_key: None,
        }),
    }
}

/// Last known event carried by a payload, looking through tombstones
pub fn last_known_event(payload: &WatchPayload) -> Option<Arc<Event>> {
    classify_deleted(payload).ok().map(|deleted| deleted.event)
}

fn unwrap_tombstone(tombstone: &DeletedFinalStateUnknown) -> std::result::Result<DeletedEvent, NormalizeError> {
    // Tombstones only ever wrap the final object state, never another tombstone
    let event = to_event_pointer(&tombstone.obj)?;
    Ok(DeletedEvent {
        event,
        tombstone_key: Some(tombstone.key.clone()),
    })
}
