//! Lane data model: waypoints, change flags, lanes and lane arrays.

use crate::error::LaneSelectError;
use crate::geometry::{self, Pose};
use laneselect_env::Header;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

// ============================================================================
// CHANGE FLAG
// ============================================================================

/// Per-waypoint marker telling whether a lane change is offered there.
///
/// The integer codes are the ones published on the change-flag topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeFlag {
    #[default]
    Straight,
    Right,
    Left,
    Unknown,
}

impl ChangeFlag {
    /// Wire code: `Straight=0, Right=1, Left=2, Unknown=-1`.
    pub fn code(self) -> i32 {
        match self {
            ChangeFlag::Straight => 0,
            ChangeFlag::Right => 1,
            ChangeFlag::Left => 2,
            ChangeFlag::Unknown => -1,
        }
    }

    /// Decodes a wire code; anything unrecognized is `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ChangeFlag::Straight,
            1 => ChangeFlag::Right,
            2 => ChangeFlag::Left,
            _ => ChangeFlag::Unknown,
        }
    }

    /// True for `Right` and `Left`.
    pub fn is_change_offer(self) -> bool {
        matches!(self, ChangeFlag::Right | ChangeFlag::Left)
    }
}

impl std::fmt::Display for ChangeFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChangeFlag::Straight => "straight",
            ChangeFlag::Right => "right",
            ChangeFlag::Left => "left",
            ChangeFlag::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// WAYPOINT / LANE
// ============================================================================

/// A pose along a lane with its target speed and change flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Position and heading in the map frame
    pub pose: Pose,

    /// Target forward speed (m/s)
    pub velocity: f64,

    /// Lane-change offer at this waypoint
    pub change_flag: ChangeFlag,
}

impl Waypoint {
    /// Creates a `Straight` waypoint.
    pub fn new(pose: Pose, velocity: f64) -> Self {
        Self {
            pose,
            velocity,
            change_flag: ChangeFlag::Straight,
        }
    }

    /// Sets the change flag (builder style).
    pub fn with_flag(mut self, change_flag: ChangeFlag) -> Self {
        self.change_flag = change_flag;
        self
    }

    /// Position of the waypoint.
    #[inline]
    pub fn position(&self) -> Point3<f64> {
        geometry::position(&self.pose)
    }
}

/// Ordered, index-addressable waypoint sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub header: Header,
    pub waypoints: Vec<Waypoint>,
}

impl Lane {
    /// Creates a lane from its waypoints.
    pub fn new(header: Header, waypoints: Vec<Waypoint>) -> Self {
        Self { header, waypoints }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Index of the last waypoint, `None` for an empty lane.
    pub fn last_index(&self) -> Option<usize> {
        self.waypoints.len().checked_sub(1)
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Bounds-checked access for indices that are expected to be valid.
    pub fn waypoint(&self, index: usize) -> Result<&Waypoint, LaneSelectError> {
        self.waypoints.get(index).ok_or(LaneSelectError::IndexOutOfBounds {
            index,
            len: self.waypoints.len(),
        })
    }

    /// Positions of all waypoints, in order.
    pub fn polyline(&self) -> Vec<Point3<f64>> {
        self.waypoints.iter().map(Waypoint::position).collect()
    }

    /// Removes all waypoints and resets the header.
    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.waypoints.shrink_to_fit();
        self.header = Header::default();
    }
}

/// Candidate lanes offered by the route planner in one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneArray {
    pub lanes: Vec<Lane>,
}

impl LaneArray {
    pub fn new(lanes: Vec<Lane>) -> Self {
        Self { lanes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::pose_from_xy_yaw;

    #[test]
    fn test_change_flag_codes() {
        for flag in [
            ChangeFlag::Straight,
            ChangeFlag::Right,
            ChangeFlag::Left,
            ChangeFlag::Unknown,
        ] {
            assert_eq!(ChangeFlag::from_code(flag.code()), flag);
        }
        assert_eq!(ChangeFlag::from_code(42), ChangeFlag::Unknown);
        assert!(ChangeFlag::Right.is_change_offer());
        assert!(!ChangeFlag::Unknown.is_change_offer());
    }

    #[test]
    fn test_checked_waypoint_access() {
        let lane = Lane::new(
            Header::default(),
            vec![Waypoint::new(pose_from_xy_yaw(0.0, 0.0, 0.0), 1.0)],
        );

        assert!(lane.waypoint(0).is_ok());
        assert_eq!(
            lane.waypoint(3),
            Err(LaneSelectError::IndexOutOfBounds { index: 3, len: 1 })
        );
        assert_eq!(lane.last_index(), Some(0));
        assert_eq!(Lane::default().last_index(), None);
    }
}
