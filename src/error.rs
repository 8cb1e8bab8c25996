//! Error types for the client core.

use thiserror::Error;

/// Main error type for subscription operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("subscription is no longer valid")]
    InvalidSubscription,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    #[error("slow consumer, messages dropped")]
    SlowConsumer,

    #[error("timeout")]
    Timeout,

    #[error("maximum delivered messages reached")]
    MaxDeliveredMsgs,

    #[error("insufficient resources: {0}")]
    Resource(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type for subscription operations.
pub type Result<T> = std::result::Result<T, Error>;
