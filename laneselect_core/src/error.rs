//! Error types for the lane selector core.

use crate::lane_registry::LaneId;
use laneselect_env::EnvError;
use thiserror::Error;

/// Errors raised by the lane selector.
///
/// Degenerate vehicle data (no lane nearby, no change offer, ...) is never an
/// error: it resolves to `None` / `-1` / `Unknown`. These variants report
/// internal-consistency failures and transport failures only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LaneSelectError {
    /// An index was stored but points past the end of its lane
    #[error("Waypoint index {index} out of bounds for lane of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A lane identifier from a lane array that has since been replaced
    #[error("Lane {id} is stale (current generation {generation})")]
    StaleLaneId { id: LaneId, generation: u64 },

    /// An operation required a selected current lane
    #[error("No current lane selected")]
    NoCurrentLane,

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The output transport rejected a message
    #[error("Publish failed: {0}")]
    Publish(#[from] EnvError),
}
