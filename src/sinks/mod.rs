//! Downstream sinks.
//!
//! Direct sinks (`glog`, `stdout`) write each record inline. Every other
//! kind is a [`BufferedDispatcher`](crate::BufferedDispatcher) in front of a
//! [`BatchTransport`](crate::BatchTransport); network clients the crate does
//! not ship are injected through the traits in [`clients`].

pub mod clients;
mod eventhub_sink;
mod factory;
mod http_sink;
mod influxdb_sink;
mod kafka_sink;
mod log_sink;
mod rockset_sink;
mod s3_sink;
mod stdout_sink;

pub use eventhub_sink::*;
pub use factory::*;
pub use http_sink::*;
pub use influxdb_sink::*;
pub use kafka_sink::*;
pub use log_sink::*;
pub use rockset_sink::*;
pub use s3_sink::*;
pub use stdout_sink::*;


use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Event;

/// Consumer of routed events.
///
/// `update_events` receives the current event and, for updates, the version
/// it supersedes. It has no failure channel: a sink logs its own errors and
/// must return promptly.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    async fn update_events(
        &self,
        new: Arc<Event>,
        old: Option<Arc<Event>>,
    );
}
