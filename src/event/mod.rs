//! Event model: the cluster event type, the raw payloads the watch layer
//! delivers, their classification, and the canonical record sinks consume.

mod event_data;
mod normalizer;
mod payload;
mod time_format;
mod types;

pub mod flatten;
pub mod rfc5424;

pub use event_data::*;
pub use normalizer::*;
pub use payload::*;
pub use types::*;

#[cfg(test)]
mod normalizer_test;
