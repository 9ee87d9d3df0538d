//! Common types for the transport abstraction.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name of a logical topic (e.g. `"base_waypoints"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic(pub String);

impl Topic {
    /// Creates a topic from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the topic name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stamp carried by stamped messages (lanes, poses, velocities).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Time since the source's epoch
    pub stamp: Duration,

    /// Coordinate frame the payload is expressed in
    pub frame_id: String,
}

impl Header {
    /// Creates a header in the `map` frame.
    pub fn map(stamp: Duration) -> Self {
        Self {
            stamp,
            frame_id: "map".to_string(),
        }
    }
}
