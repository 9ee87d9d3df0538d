//! Error types for the transport abstraction.

use thiserror::Error;

/// Errors that can occur in the transport abstraction layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// The receiving side of a topic has been dropped
    #[error("Topic closed: {0}")]
    TopicClosed(String),

    /// Message serialization/deserialization failed
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl EnvError {
    /// Creates a topic-closed error.
    pub fn closed(topic: impl std::fmt::Display) -> Self {
        Self::TopicClosed(topic.to_string())
    }

    /// Creates a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }
}
