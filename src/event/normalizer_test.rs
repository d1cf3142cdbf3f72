use std::sync::Arc;

use super::*;
use crate::test_utils::create_test_event;
use crate::NormalizeError;

fn unexpected(type_name: &str) -> NormalizeError {
    NormalizeError::UnexpectedType(type_name.to_string())
}

#[test]
fn to_event_pointer_should_return_the_same_allocation() {
    let event = Arc::new(create_test_event("pod-a.1", "Scheduled"));
    let payload = WatchPayload::Event(event.clone());

    let result = to_event_pointer(&payload).unwrap();

    assert!(Arc::ptr_eq(&event, &result));
}

#[test]
fn to_event_pointer_should_reject_every_other_shape() {
    let event = create_test_event("pod-a.1", "Scheduled");
    let cases = vec![
        (WatchPayload::EventValue(event.clone()), "v1.Event"),
        (WatchPayload::other("v1.Pod"), "v1.Pod"),
        (WatchPayload::other("*v1.Pod"), "*v1.Pod"),
        (WatchPayload::other("string"), "string"),
        (WatchPayload::Nil, "<nil>"),
        (
            WatchPayload::tombstone("default/pod-a.1", WatchPayload::event(event.clone())),
            "*cache.DeletedFinalStateUnknown",
        ),
        (
            WatchPayload::TombstoneValue(DeletedFinalStateUnknown {
                key: "default/pod-a.1".to_string(),
                obj: Box::new(WatchPayload::event(event)),
            }),
            "cache.DeletedFinalStateUnknown",
        ),
    ];

    for (payload, type_name) in cases {
        assert_eq!(to_event_pointer(&payload), Err(unexpected(type_name)));
    }
}

#[test]
fn unexpected_type_should_render_the_type_name() {
    let err = to_event_pointer(&WatchPayload::Nil).unwrap_err();
    assert_eq!(err.to_string(), "unexpected type: <nil>");

    let err = to_event_pointer(&WatchPayload::other("v1.Pod")).unwrap_err();
    assert_eq!(err.to_string(), "unexpected type: v1.Pod");
}

#[test]
fn classify_deleted_should_unwrap_tombstones() {
    let event = Arc::new(create_test_event("pod-a.1", "Killing"));

    let deleted = classify_deleted(&WatchPayload::tombstone(
        "default/pod-a.1",
        WatchPayload::Event(event.clone()),
    ))
    .unwrap();
    assert!(Arc::ptr_eq(&deleted.event, &event));
    assert_eq!(deleted.tombstone_key.as_deref(), Some("default/pod-a.1"));

    let deleted = classify_deleted(&WatchPayload::TombstoneValue(DeletedFinalStateUnknown {
        key: "default/pod-a.1".to_string(),
        obj: Box::new(WatchPayload::Event(event.clone())),
    }))
    .unwrap();
    assert!(Arc::ptr_eq(&deleted.event, &event));
}

#[test]
fn classify_deleted_should_accept_plain_event_pointers() {
    let event = Arc::new(create_test_event("pod-a.1", "Killing"));

    let deleted = classify_deleted(&WatchPayload::Event(event.clone())).unwrap();

    assert!(Arc::ptr_eq(&deleted.event, &event));
    assert!(deleted.tombstone_key.is_none());
}

#[test]
fn classify_deleted_should_report_what_a_tombstone_wraps() {
    let cases = vec![
        (WatchPayload::tombstone("k", WatchPayload::Nil), "<nil>"),
        (WatchPayload::tombstone("k", WatchPayload::other("v1.Pod")), "v1.Pod"),
        (
            WatchPayload::tombstone("k", WatchPayload::EventValue(create_test_event("e", "r"))),
            "v1.Event",
        ),
        (
            WatchPayload::tombstone("k", WatchPayload::tombstone("k", WatchPayload::Nil)),
            "*cache.DeletedFinalStateUnknown",
        ),
        (WatchPayload::TombstoneValue(DeletedFinalStateUnknown::default()), "<nil>"),
    ];

    for (payload, type_name) in cases {
        assert_eq!(classify_deleted(&payload), Err(unexpected(type_name)));
    }
}

#[test]
fn last_known_event_should_look_through_tombstones() {
    let event = Arc::new(create_test_event("pod-a.1", "Killing"));

    assert!(last_known_event(&WatchPayload::tombstone("k", WatchPayload::Event(event.clone()))).is_some());
    assert!(last_known_event(&WatchPayload::Event(event)).is_some());
    assert!(last_known_event(&WatchPayload::Nil).is_none());
    assert!(last_known_event(&WatchPayload::other("string")).is_none());
}
