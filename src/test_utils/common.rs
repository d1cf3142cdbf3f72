use chrono::TimeZone;
use chrono::Utc;

use crate::Event;
use crate::EventSource;
use crate::ObjectMeta;
use crate::ObjectReference;
use crate::EVENT_TYPE_NORMAL;

/// Builds a `Normal` event about pod `<name>` in namespace `default`,
/// reported by `kubelet` on `node-1` at 2024-03-01T10:20:30Z.
pub(crate) fn create_test_event(
    name: &str,
    reason: &str,
) -> Event {
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).single();
    let pod = name.split('.').next().unwrap_or(name).to_string();

    Event {
        metadata: ObjectMeta {
            name: name.to_string(),
            namespace: "default".to_string(),
            uid: format!("uid-{name}"),
            resource_version: "1".to_string(),
            creation_timestamp: ts,
            ..ObjectMeta::default()
        },
        involved_object: ObjectReference {
            kind: "Pod".to_string(),
            namespace: "default".to_string(),
            name: pod.clone(),
            uid: format!("pod-uid-{pod}"),
            api_version: "v1".to_string(),
            ..ObjectReference::default()
        },
        reason: reason.to_string(),
        message: format!("{reason} {pod}"),
        source: EventSource {
            component: "kubelet".to_string(),
            host: "node-1".to_string(),
        },
        first_timestamp: ts,
        last_timestamp: ts,
        count: 1,
        event_type: EVENT_TYPE_NORMAL.to_string(),
        ..Event::default()
    }
}
