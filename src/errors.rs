//! Event Router Error Hierarchy
//!
//! Defines the error types of the event pipeline, categorized by the stage
//! that produces them: watch payload classification, wire encoding, sink
//! delivery and startup configuration.

use std::time::Duration;

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Infrastructure-level failures (sink transport, I/O, serialization)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration source loading or parsing failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration values rejected by validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Watch payload could not be classified as an event
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// Downstream delivery failures
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Wire format encoding and decoding failures
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

/// Classification failure for a single watch notification.
///
/// Terminal for that notification only: the caller logs and drops it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("unexpected type: {0}")]
    UnexpectedType(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Transport client reported a failure
    #[error("{sink} transport failed: {source}")]
    Transport {
        sink: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Remote endpoint answered with a non-success status
    #[error("{sink} returned HTTP status {status}: {body}")]
    HttpStatus {
        sink: String,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Queue was full under the drop-newest overflow policy
    #[error("Queue of {0} is full")]
    QueueFull(String),

    /// Enqueue attempt timed out under the block overflow policy
    #[error("Enqueue to {sink} timed out after {duration:?}")]
    EnqueueTimeout { sink: String, duration: Duration },

    /// Drain worker has stopped and the queue no longer accepts records
    #[error("Queue of {0} is closed")]
    QueueClosed(String),

    /// Sink kind requires an external client that was not registered
    #[error("No {client} client registered for sink {sink}")]
    MissingClient { sink: String, client: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Flattening requires a JSON object at the top level
    #[error("failed to flatten JSON: {0}")]
    Flatten(String),

    /// Length-prefixed syslog framing violations
    #[error(transparent)]
    Framing(#[from] FramingError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    #[error("invalid format: missing length prefix")]
    MissingLengthPrefix,

    #[error("invalid format: length prefix {0:?} is not a decimal number")]
    InvalidLengthPrefix(String),

    #[error("invalid syslog format")]
    InvalidSyslog,

    #[error("invalid timestamp format: {0}")]
    InvalidTimestamp(String),
}

// ============== Conversion Implementations ============== //
impl From<SinkError> for Error {
    fn from(e: SinkError) -> Self {
        Error::System(SystemError::Sink(e))
    }
}

impl From<SerializationError> for Error {
    fn from(e: SerializationError) -> Self {
        Error::System(SystemError::Serialization(e))
    }
}

impl From<FramingError> for Error {
    fn from(e: FramingError) -> Self {
        Error::System(SystemError::Serialization(SerializationError::Framing(e)))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::System(SystemError::Serialization(SerializationError::Json(e)))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::System(SystemError::Io(e))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        SinkError::Http(e).into()
    }
}

impl From<JoinError> for Error {
    fn from(err: JoinError) -> Self {
        Error::System(SystemError::TaskFailed(err))
    }
}
