//! Routes cluster lifecycle events to pluggable downstream sinks.
//!
//! The watch layer hands raw notifications to the [`EventRouter`], which
//! normalizes them and fans each accepted event out to every configured
//! [`EventSink`]. Network sinks sit behind a [`BufferedDispatcher`] that
//! batches records on its own drain task.

mod config;
mod dispatch;
mod errors;
mod event;
mod router;
mod sinks;
mod watch;

pub mod metrics;
pub mod utils;

pub use config::*;
pub use dispatch::*;
pub use errors::*;
pub use event::*;
pub use router::*;
pub use sinks::*;
pub use watch::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;
