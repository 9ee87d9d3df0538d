//! Messages exchanged with the surrounding planning stack.

use crate::config::LaneSelectConfig;
use crate::geometry::Pose;
use crate::lane::{Lane, LaneArray};
use crate::markers::MarkerArray;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Vehicle velocity in its own frame. Only `linear.x` is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    pub linear: Vector3<f64>,
    pub angular: Vector3<f64>,
}

impl Twist {
    /// Pure forward motion at `speed` m/s.
    pub fn forward(speed: f64) -> Self {
        Self {
            linear: Vector3::new(speed, 0.0, 0.0),
            angular: Vector3::zeros(),
        }
    }
}

/// Inputs consumed by the lane selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputMessage {
    /// Full replacement of the candidate lanes
    LaneArray(LaneArray),
    /// Current vehicle pose
    Pose(Pose),
    /// Current vehicle velocity
    Velocity(Twist),
    /// Commanded high-level state, e.g. `"LANE_CHANGE"`
    State(String),
    /// Runtime configuration update
    Config(LaneSelectConfig),
}

/// Outputs produced by the lane selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutputMessage {
    /// Lane to follow (on selection and on state-transition edges only)
    Lane(Lane),
    /// Closest waypoint on the followed lane, `-1` when unknown
    ClosestWaypoint(i32),
    /// Change flag code of the followed lane
    ChangeFlag(i32),
    /// Debug visualization
    Markers(MarkerArray),
}

impl OutputMessage {
    /// Closest-waypoint message from an optional index.
    pub fn closest(index: Option<usize>) -> Self {
        let code = index
            .and_then(|i| i32::try_from(i).ok())
            .unwrap_or(-1);
        OutputMessage::ClosestWaypoint(code)
    }

    /// Topic name this message is published on.
    pub fn topic(&self) -> &'static str {
        match self {
            OutputMessage::Lane(_) => "base_waypoints",
            OutputMessage::ClosestWaypoint(_) => "closest_waypoint",
            OutputMessage::ChangeFlag(_) => "change_flag",
            OutputMessage::Markers(_) => "lane_select_marker",
        }
    }
}
