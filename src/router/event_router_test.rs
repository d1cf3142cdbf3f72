use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::test_utils::create_test_event;
use crate::test_utils::RecordingTransport;
use crate::BufferedDispatcher;
use crate::DeletedFinalStateUnknown;
use crate::DispatchConfig;
use crate::Event;
use crate::EventSink;
use crate::ManufacturedSink;
use crate::MockEventSink;
use crate::Verb;
use crate::WatchPayload;

type Call = (Arc<Event>, Option<Arc<Event>>);

/// Sink that keeps every call it receives
#[derive(Default)]
struct CapturingSink {
    calls: Mutex<Vec<Call>>,
}

#[async_trait]
impl EventSink for CapturingSink {
    async fn update_events(
        &self,
        new: Arc<Event>,
        old: Option<Arc<Event>>,
    ) {
        self.calls.lock().push((new, old));
    }
}

fn router_with(sinks: &[Arc<CapturingSink>]) -> EventRouter {
    let sinks = sinks
        .iter()
        .enumerate()
        .map(|(i, sink)| (format!("capture-{i}"), sink.clone() as Arc<dyn EventSink>))
        .collect();
    EventRouter::with_sinks(sinks, false)
}

fn every_payload_shape() -> Vec<WatchPayload> {
    let event = create_test_event("pod-a.1", "Killing");
    vec![
        WatchPayload::event(event.clone()),
        WatchPayload::EventValue(event.clone()),
        WatchPayload::tombstone("default/pod-a.1", WatchPayload::event(event.clone())),
        WatchPayload::tombstone("default/pod-a.1", WatchPayload::EventValue(event.clone())),
        WatchPayload::tombstone("default/pod-a.1", WatchPayload::Nil),
        WatchPayload::tombstone(
            "default/pod-a.1",
            WatchPayload::tombstone("default/pod-a.1", WatchPayload::event(event.clone())),
        ),
        WatchPayload::TombstoneValue(DeletedFinalStateUnknown {
            key: "default/pod-a.1".to_string(),
            obj: Box::new(WatchPayload::event(event.clone())),
        }),
        WatchPayload::TombstoneValue(DeletedFinalStateUnknown::default()),
        WatchPayload::other("*v1.Pod"),
        WatchPayload::other("v1.Pod"),
        WatchPayload::other("string"),
        WatchPayload::Nil,
    ]
}

#[tokio::test]
async fn on_delete_should_accept_every_payload_shape() {
    let sink = Arc::new(CapturingSink::default());
    let router = router_with(&[sink.clone()]);

    for payload in every_payload_shape() {
        router.on_delete(&payload).await;
    }

    assert!(sink.calls.lock().is_empty());
}

#[tokio::test]
async fn on_add_should_hand_the_same_event_to_every_sink() {
    let first = Arc::new(CapturingSink::default());
    let second = Arc::new(CapturingSink::default());
    let router = router_with(&[first.clone(), second.clone()]);
    let event = Arc::new(create_test_event("pod-a.1", "Scheduled"));

    router.on_add(&WatchPayload::Event(event.clone())).await;

    for sink in [&first, &second] {
        let calls = sink.calls.lock();
        assert_eq!(calls.len(), 1);
        assert!(Arc::ptr_eq(&calls[0].0, &event));
        assert!(calls[0].1.is_none());
    }
}

#[tokio::test]
async fn on_add_should_drop_anything_but_an_event_pointer() {
    let sink = Arc::new(CapturingSink::default());
    let router = router_with(&[sink.clone()]);

    for payload in every_payload_shape().into_iter().skip(1) {
        router.on_add(&payload).await;
    }

    assert!(sink.calls.lock().is_empty());
}

#[tokio::test]
async fn on_update_should_forward_both_versions() {
    let sink = Arc::new(CapturingSink::default());
    let router = router_with(&[sink.clone()]);
    let old = Arc::new(create_test_event("pod-a.1", "BackOff"));
    let mut updated = create_test_event("pod-a.1", "BackOff");
    updated.count = 2;
    let new = Arc::new(updated);

    router
        .on_update(&WatchPayload::Event(old.clone()), &WatchPayload::Event(new.clone()))
        .await;

    let calls = sink.calls.lock();
    assert_eq!(calls.len(), 1);
    assert!(Arc::ptr_eq(&calls[0].0, &new));
    assert!(Arc::ptr_eq(calls[0].1.as_ref().unwrap(), &old));
}

#[tokio::test]
async fn on_update_should_treat_an_unusable_old_version_as_absent() {
    let sink = Arc::new(CapturingSink::default());
    let router = router_with(&[sink.clone()]);
    let new = Arc::new(create_test_event("pod-a.1", "BackOff"));

    router.on_update(&WatchPayload::Nil, &WatchPayload::Event(new.clone())).await;
    router
        .on_update(&WatchPayload::other("v1.Pod"), &WatchPayload::Event(new.clone()))
        .await;

    let calls = sink.calls.lock();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(_, old)| old.is_none()));
}

#[tokio::test]
async fn on_update_should_drop_an_unusable_new_version() {
    let mut sink = MockEventSink::new();
    sink.expect_update_events().never();
    let router = EventRouter::with_sinks(vec![("mock".to_string(), Arc::new(sink) as Arc<dyn EventSink>)], false);
    let old = WatchPayload::event(create_test_event("pod-a.1", "BackOff"));

    router.on_update(&old, &WatchPayload::Nil).await;
    router
        .on_update(&old, &WatchPayload::EventValue(create_test_event("pod-a.1", "BackOff")))
        .await;
}

#[tokio::test]
async fn sinks_should_be_called_once_per_notification() {
    let mut sink = MockEventSink::new();
    sink.expect_update_events()
        .times(2)
        .withf(|new, _| new.reason == "Pulled")
        .returning(|_, _| ());
    let router = EventRouter::with_sinks(vec![("mock".to_string(), Arc::new(sink) as Arc<dyn EventSink>)], true);

    router
        .on_add(&WatchPayload::event(create_test_event("pod-a.1", "Pulled")))
        .await;
    router
        .on_add(&WatchPayload::event(create_test_event("pod-a.2", "Pulled")))
        .await;
}

#[tokio::test]
async fn run_should_deliver_pending_records_before_returning() {
    let transport = RecordingTransport::new();
    let (dispatcher, worker) = BufferedDispatcher::new("buffered", transport.clone(), &DispatchConfig::default());
    let stats = dispatcher.stats();
    let router = Arc::new(EventRouter::new(
        vec![ManufacturedSink {
            name: "buffered".to_string(),
            sink: Arc::new(dispatcher),
            worker: Some(worker),
            stats: Some(stats.clone()),
        }],
        false,
    ));
    assert_eq!(router.sink_names(), vec!["buffered"]);

    let old = WatchPayload::event(create_test_event("pod-a.1", "Created"));
    router.on_add(&old).await;
    router
        .on_update(&old, &WatchPayload::event(create_test_event("pod-a.1", "Started")))
        .await;

    let stop = CancellationToken::new();
    stop.cancel();
    router.run(stop).await.unwrap();

    let records = transport.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].verb, Verb::Added);
    assert_eq!(records[1].verb, Verb::Updated);
    assert_eq!(records[1].old_event.as_ref().unwrap().reason, "Created");
    assert_eq!(stats.delivered(), 2);
}

#[tokio::test]
async fn run_without_workers_should_wait_for_stop() {
    let router = Arc::new(router_with(&[]));
    let stop = CancellationToken::new();

    let handle = tokio::spawn({
        let router = router.clone();
        let stop = stop.clone();
        async move { router.run(stop).await }
    });
    tokio::task::yield_now().await;
    assert!(!handle.is_finished());

    stop.cancel();
    handle.await.unwrap().unwrap();
}
