//! Commanded behavior state and the latest vehicle snapshot.

use crate::geometry::Pose;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Behavior commanded by the upstream decision maker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandedState {
    #[default]
    MoveForward,
    LaneChange,
}

impl CommandedState {
    /// Maps the external state string.
    ///
    /// Only `"LANE_CHANGE"` selects a lane change. `"MOVE_FORWARD"` and the
    /// initial `"UNKNOWN"` map to `MoveForward`; anything else does too, with
    /// a warning.
    pub fn from_command(command: &str) -> Self {
        match command {
            "LANE_CHANGE" => CommandedState::LaneChange,
            "MOVE_FORWARD" | "UNKNOWN" => CommandedState::MoveForward,
            other => {
                warn!("Unrecognized commanded state {:?}, treating as MOVE_FORWARD", other);
                CommandedState::MoveForward
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandedState::MoveForward => "MOVE_FORWARD",
            CommandedState::LaneChange => "LANE_CHANGE",
        }
    }
}

impl std::fmt::Display for CommandedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Latest inputs describing the vehicle, updated field by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleState {
    /// Latest pose, `None` until the first pose arrived
    pub pose: Option<Pose>,

    /// Latest forward speed (m/s), `None` until the first velocity arrived
    pub velocity: Option<f64>,

    /// Latest commanded state
    pub commanded: CommandedState,

    /// State the previous processed tick acted on
    pub previous: CommandedState,
}

impl VehicleState {
    /// Pose and velocity, once both have been received.
    pub fn kinematics(&self) -> Option<(Pose, f64)> {
        Some((self.pose?, self.velocity?))
    }

    /// True when the commanded state differs from the one acted on last tick.
    pub fn is_transition(&self) -> bool {
        self.commanded != self.previous
    }
}
