use std::sync::Arc;

use eventrouter::manufacture_sink;
use eventrouter::DispatchConfig;
use eventrouter::EventHandler;
use eventrouter::EventRouter;
use eventrouter::JsonLinesSource;
use eventrouter::KafkaSinkConfig;
use eventrouter::RocksetSinkConfig;
use eventrouter::SinkClients;
use eventrouter::SinkConfig;
use eventrouter::Verb;
use eventrouter::WatchPayload;
use serde_json::json;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use crate::commons::event_object;
use crate::commons::shared;
use crate::commons::watch_line;
use crate::commons::CapturingBroker;
use crate::commons::CapturingStore;
use crate::enable_logger;

fn kafka(buffer_size: usize) -> SinkConfig {
    SinkConfig::Kafka(KafkaSinkConfig {
        topic: "cluster-events".to_string(),
        dispatch: DispatchConfig {
            buffer_size,
            ..DispatchConfig::default()
        },
    })
}

fn rockset() -> SinkConfig {
    SinkConfig::Rockset(RocksetSinkConfig {
        workspace: "commons".to_string(),
        collection: "events".to_string(),
        dispatch: DispatchConfig::default(),
    })
}

/// Watch feed to two buffered sinks: every sink sees every accepted event
/// once, in order, with deletes and foreign objects filtered out.
#[tokio::test]
async fn test_watch_feed_reaches_every_sink_in_order() {
    enable_logger();
    let broker = shared::<CapturingBroker>();
    let store = shared::<CapturingStore>();
    let clients = SinkClients::default()
        .with_broker(broker.clone())
        .with_document_store(store.clone());

    let sinks = vec![
        manufacture_sink("kafka", &kafka(100), &clients).unwrap(),
        manufacture_sink("rockset", &rockset(), &clients).unwrap(),
    ];
    let router = Arc::new(EventRouter::new(sinks, true));

    let input = [
        watch_line("ADDED", event_object("pod-a.1", "Scheduled", 1)),
        watch_line("ADDED", json!({"kind": "Pod", "apiVersion": "v1"})),
        watch_line("ADDED", event_object("pod-a.2", "Pulling", 1)),
        watch_line("MODIFIED", event_object("pod-a.2", "Pulling", 2)),
        watch_line("DELETED", event_object("pod-a.1", "Scheduled", 1)),
        "{ not json".to_string(),
        watch_line("ADDED", event_object("pod-a.3", "Started", 1)),
    ]
    .join("\n");

    let stop = CancellationToken::new();
    let runner = tokio::spawn({
        let router = router.clone();
        let stop = stop.clone();
        async move { router.run(stop).await }
    });

    JsonLinesSource::new(BufReader::new(input.as_bytes()))
        .run(router.clone(), stop.clone())
        .await
        .unwrap();
    stop.cancel();
    runner.await.unwrap().unwrap();

    let messages = broker.messages();
    assert_eq!(broker.reasons(), vec!["Scheduled", "Pulling", "Pulling", "Started"]);
    assert!(messages.iter().all(|(topic, _, _)| topic == "cluster-events"));
    assert_eq!(messages[0].1, "uid-pod-a.1");

    let verbs: Vec<Verb> = messages.iter().map(|(_, _, record)| record.verb).collect();
    assert_eq!(verbs, vec![Verb::Added, Verb::Added, Verb::Updated, Verb::Added]);
    let updated = &messages[2].2;
    assert_eq!(updated.event.count, 2);
    assert_eq!(updated.old_event.as_ref().unwrap().count, 1);

    let documents: Vec<_> = store.calls().into_iter().flat_map(|(_, _, docs)| docs).collect();
    assert_eq!(documents.len(), 4);
    assert_eq!(documents[2]["verb"], "UPDATED");
    assert_eq!(documents[2]["old_event"]["count"], 1);
    assert!(store
        .calls()
        .iter()
        .all(|(workspace, collection, _)| workspace == "commons" && collection == "events"));
}

/// A full queue drops the newest records; the ones accepted are delivered
/// during the final drain.
#[tokio::test]
async fn test_full_queue_keeps_the_earliest_records() {
    enable_logger();
    let broker = shared::<CapturingBroker>();
    let clients = SinkClients::default().with_broker(broker.clone());
    let sink = manufacture_sink("kafka", &kafka(3), &clients).unwrap();
    let stats = sink.stats.clone().unwrap();
    let router = EventRouter::new(vec![sink], false);

    for i in 0..5 {
        let event = serde_json::from_value(event_object(&format!("pod-a.{i}"), &format!("Reason{i}"), 1)).unwrap();
        router.on_add(&WatchPayload::event(event)).await;
    }
    assert_eq!(stats.dropped(), 2);

    let stop = CancellationToken::new();
    stop.cancel();
    router.run(stop).await.unwrap();

    assert_eq!(broker.reasons(), vec!["Reason0", "Reason1", "Reason2"]);
    assert_eq!(stats.delivered(), 3);
}

/// Deletes of every shape are absorbed without reaching a sink
#[tokio::test]
async fn test_deletes_are_not_forwarded() {
    enable_logger();
    let broker = shared::<CapturingBroker>();
    let clients = SinkClients::default().with_broker(broker.clone());
    let router = EventRouter::new(vec![manufacture_sink("kafka", &kafka(10), &clients).unwrap()], false);

    let event = serde_json::from_value(event_object("pod-a.1", "Killing", 1)).unwrap();
    router.on_delete(&WatchPayload::event(event)).await;
    router
        .on_delete(&WatchPayload::tombstone("default/pod-a.1", WatchPayload::Nil))
        .await;
    router.on_delete(&WatchPayload::other("*v1.Pod")).await;

    let stop = CancellationToken::new();
    stop.cancel();
    router.run(stop).await.unwrap();

    assert!(broker.messages().is_empty());
}
