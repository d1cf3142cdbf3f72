//! Process-wide prometheus counters of the router and its dispatchers.
//!
//! Collectors live in a crate registry; exposing them over HTTP is left to
//! the embedding process (`render` produces the text format).

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;

use crate::Event;
use crate::Result;
use crate::SystemError;


lazy_static! {
    pub static ref EVENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("eventrouter_events_total", "Events routed, by type, object and reason"),
        &["type", "involved_object_kind", "involved_object_namespace", "reason", "source"]
    )
    .expect("metric can not be created");

    pub static ref DELIVERED_EVENTS: IntCounterVec = IntCounterVec::new(
        Opts::new("eventrouter_sink_delivered_total", "Records handed to a sink transport"),
        &["sink"]
    )
    .expect("metric can not be created");

    pub static ref DROPPED_EVENTS: IntCounterVec = IntCounterVec::new(
        Opts::new("eventrouter_sink_dropped_total", "Records dropped at a full or closed sink queue"),
        &["sink"]
    )
    .expect("metric can not be created");

    pub static ref FAILED_BATCHES: IntCounterVec = IntCounterVec::new(
        Opts::new("eventrouter_sink_failed_batches_total", "Transport calls that failed"),
        &["sink"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

pub(crate) fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(EVENTS_TOTAL.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(DELIVERED_EVENTS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(DROPPED_EVENTS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(FAILED_BATCHES.clone()))
        .expect("collector can be registered");
}

/// Registers the collectors with [`REGISTRY`]; later calls are no-ops
pub fn init() {
    REGISTER.call_once(|| register_custom_metrics(&REGISTRY));
}

/// Counts one routed event
pub fn record_event(event: &Event) {
    let source = if event.source.host.is_empty() {
        event.source.component.clone()
    } else {
        format!("{}/{}", event.source.component, event.source.host)
    };

    EVENTS_TOTAL
        .with_label_values(&[
            event.event_type.as_str(),
            event.involved_object.kind.as_str(),
            event.involved_object.namespace.as_str(),
            event.reason.as_str(),
            source.as_str(),
        ])
        .inc();
}

/// Renders [`REGISTRY`] in the prometheus text exposition format
pub fn render() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| SystemError::Io(std::io::Error::other(e)))?;

    String::from_utf8(buffer)
        .map_err(|e| SystemError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)).into())
}
