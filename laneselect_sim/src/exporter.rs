//! JSON exporter for offline inspection of a run.

use laneselect_core::geometry::{self, Pose};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// Planar pose sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl PoseSample {
    pub fn new(pose: &Pose) -> Self {
        let p = geometry::position(pose);
        Self {
            x: p.x,
            y: p.y,
            yaw: geometry::yaw(pose),
        }
    }
}

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Simulation time in seconds
    pub time_sec: f64,

    /// Ground truth pose
    pub true_pose: PoseSample,

    /// Pose handed to the selector
    pub measured_pose: PoseSample,

    /// Commanded state
    pub state: String,

    /// Tick outcome
    pub outcome: String,

    /// Last published closest waypoint
    pub closest_waypoint: i32,

    /// Last published change flag code
    pub change_flag: i32,

    /// Index of the current lane in the latest lane array
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_lane: Option<usize>,

    /// Waypoints of the prepared change lane (0 when none)
    pub change_lane_len: usize,

    /// Distance to the followed lane
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_track_error: Option<f64>,
}

/// Simulation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimEvent {
    pub time_sec: f64,
    pub message: String,
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<SimEvent>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            events: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    pub fn add_event(&mut self, time_sec: f64, message: impl Into<String>) {
        self.events.push(SimEvent {
            time_sec,
            message: message.into(),
        });
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_serializes_frames() {
        let pose = geometry::pose_from_xy_yaw(1.0, 2.0, 0.5);
        let mut export = SimExport::new("lane_change", 42);
        export.add_frame(SimFrame {
            time_sec: 0.1,
            true_pose: PoseSample::new(&pose),
            measured_pose: PoseSample::new(&pose),
            state: "MOVE_FORWARD".to_string(),
            outcome: "MoveForward".to_string(),
            closest_waypoint: 3,
            change_flag: 0,
            current_lane: Some(0),
            change_lane_len: 0,
            cross_track_error: None,
        });
        export.add_event(0.1, "LANE_CHANGE commanded");
        export.finalize(true, None);

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["frames"][0]["closest_waypoint"], 3);
        assert!(json["frames"][0].get("cross_track_error").is_none());
        assert_eq!(json["events"][0]["message"], "LANE_CHANGE commanded");
        assert_eq!(export.duration_sec, 0.1);
    }
}
