//! Runtime configuration of the lane selector.

use crate::error::LaneSelectError;
use serde::{Deserialize, Serialize};

/// Tunables of the lane selector.
///
/// Replaced wholesale by a configuration update; takes effect on the next
/// recomputation. Values are not validated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneSelectConfig {
    /// Lateral gate for neighbor lanes and localization-loss gate (m) (default: 3.0)
    pub distance_threshold: f64,

    /// Waypoints flagged at the start of the target-lane entry (default: 10.0)
    pub lane_change_interval: f64,

    /// Seconds of travel used to place the connector end (default: 2.0)
    pub lane_change_target_ratio: f64,

    /// Lower bound of the speed-scaled connector distance (m) (default: 5.0)
    pub lane_change_target_minimum: f64,

    /// Interpolated waypoints in the connector curve (default: 10)
    pub hermite_curve_sample_count: usize,
}

impl Default for LaneSelectConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 3.0,
            lane_change_interval: 10.0,
            lane_change_target_ratio: 2.0,
            lane_change_target_minimum: 5.0,
            hermite_curve_sample_count: 10,
        }
    }
}

impl LaneSelectConfig {
    /// Parses a configuration from JSON; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, LaneSelectError> {
        serde_json::from_str(json).map_err(|e| LaneSelectError::InvalidConfig(e.to_string()))
    }

    /// `lane_change_interval` as a waypoint count.
    ///
    /// A fractional interval covers every waypoint index strictly below
    /// `start + interval`, hence the ceiling.
    pub fn lane_change_interval_waypoints(&self) -> usize {
        self.lane_change_interval.max(0.0).ceil() as usize
    }
}
