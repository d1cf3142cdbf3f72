use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use super::time_format;

/// Event type reported by the cluster for routine lifecycle changes
pub const EVENT_TYPE_NORMAL: &str = "Normal";
/// Event type reported by the cluster for conditions needing attention
pub const EVENT_TYPE_WARNING: &str = "Warning";

/// A cluster lifecycle event, as served by the core `v1` API group.
///
/// Field names follow the API's camelCase JSON. Absent timestamps serialize
/// as `null`; empty optional strings and a zero `count` are omitted. Keys
/// without a typed field are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub involved_object: ObjectReference,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    #[serde(default)]
    pub source: EventSource,

    #[serde(default, with = "time_format::seconds")]
    pub first_timestamp: Option<DateTime<Utc>>,

    #[serde(default, with = "time_format::seconds")]
    pub last_timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub count: i32,

    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub event_type: String,

    #[serde(default, with = "time_format::micros")]
    pub event_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action: String,

    #[serde(default)]
    pub reporting_component: String,

    #[serde(default)]
    pub reporting_instance: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<EventSeries>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<ObjectReference>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Data of a series of occurrences of the same event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSeries {
    #[serde(default)]
    pub count: i32,

    #[serde(default, with = "time_format::micros")]
    pub last_observed_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generate_name: String,

    #[serde(default, with = "time_format::seconds")]
    pub creation_timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub uid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_owner_deletion: Option<bool>,
}

/// Reference to the object an event is about
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field_path: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventSource {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub component: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
}

impl Event {
    /// Store key of the event: `<namespace>/<name>`, or just `<name>` for
    /// cluster-scoped events.
    pub fn store_key(&self) -> String {
        if self.metadata.namespace.is_empty() {
            self.metadata.name.clone()
        } else {
            format!("{}/{}", self.metadata.namespace, self.metadata.name)
        }
    }

    pub fn is_warning(&self) -> bool {
        self.event_type == EVENT_TYPE_WARNING
    }
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}
