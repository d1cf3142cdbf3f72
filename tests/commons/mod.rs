use std::sync::Arc;

use async_trait::async_trait;
use eventrouter::clients::BrokerProducer;
use eventrouter::clients::DocumentStore;
use eventrouter::EventData;
use eventrouter::Result;
use parking_lot::Mutex;
use serde_json::json;
use serde_json::Value;

/// Broker producer that keeps `(topic, key, record)` of every message
#[derive(Default)]
pub struct CapturingBroker {
    messages: Mutex<Vec<(String, String, EventData)>>,
}

impl CapturingBroker {
    pub fn messages(&self) -> Vec<(String, String, EventData)> {
        self.messages.lock().clone()
    }

    pub fn reasons(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .map(|(_, _, record)| record.event.reason.clone())
            .collect()
    }
}

#[async_trait]
impl BrokerProducer for CapturingBroker {
    async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: Vec<u8>,
    ) -> Result<()> {
        let record: EventData = serde_json::from_slice(&payload)?;
        self.messages.lock().push((topic.to_string(), key.to_string(), record));
        Ok(())
    }
}

/// Document store that keeps every ingestion call
#[derive(Default)]
pub struct CapturingStore {
    calls: Mutex<Vec<(String, String, Vec<Value>)>>,
}

impl CapturingStore {
    pub fn calls(&self) -> Vec<(String, String, Vec<Value>)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl DocumentStore for CapturingStore {
    async fn add_documents(
        &self,
        workspace: &str,
        collection: &str,
        documents: Vec<Value>,
    ) -> Result<()> {
        self.calls
            .lock()
            .push((workspace.to_string(), collection.to_string(), documents));
        Ok(())
    }
}

pub fn shared<T: Default>() -> Arc<T> {
    Arc::new(T::default())
}

/// Core `v1` event object as served by a watch stream
pub fn event_object(
    name: &str,
    reason: &str,
    count: i32,
) -> Value {
    let pod = name.split('.').next().unwrap_or(name);
    json!({
        "kind": "Event",
        "apiVersion": "v1",
        "metadata": {
            "name": name,
            "namespace": "default",
            "uid": format!("uid-{name}"),
            "resourceVersion": count.to_string(),
        },
        "involvedObject": {
            "kind": "Pod",
            "namespace": "default",
            "name": pod,
            "uid": format!("pod-uid-{pod}"),
            "apiVersion": "v1",
        },
        "reason": reason,
        "message": format!("{reason} {pod}"),
        "source": { "component": "kubelet", "host": "node-1" },
        "firstTimestamp": "2024-03-01T10:20:30Z",
        "lastTimestamp": "2024-03-01T10:20:30Z",
        "count": count,
        "type": "Normal",
    })
}

pub fn watch_line(
    kind: &str,
    object: Value,
) -> String {
    json!({ "type": kind, "object": object }).to_string()
}
