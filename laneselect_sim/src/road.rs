//! Road builder - parallel candidate lanes around a reference centerline.
//!
//! The centerline is integrated from a constant curvature; every lane is
//! the centerline shifted sideways in the frame of each centerline pose, so
//! waypoint `i` of all lanes lies on the same cross-section.

use crate::error::SimError;
use laneselect_core::geometry::{self, Pose};
use laneselect_core::{ChangeFlag, Lane, LaneArray, Waypoint};
use laneselect_env::Header;
use nalgebra::Point3;
use std::ops::Range;
use std::time::Duration;

/// A change offer painted on one lane.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeOffer {
    pub lane: usize,
    pub waypoints: Range<usize>,
    pub flag: ChangeFlag,
}

/// Builder for a [`LaneArray`] of parallel lanes.
#[derive(Debug, Clone)]
pub struct RoadBuilder {
    waypoint_count: usize,
    spacing_m: f64,
    curvature: f64,
    speed_mps: f64,
    lateral_offsets: Vec<f64>,
    offers: Vec<ChangeOffer>,
    stamp: Duration,
}

impl RoadBuilder {
    /// Straight single-lane road.
    pub fn new(waypoint_count: usize, spacing_m: f64) -> Self {
        Self {
            waypoint_count,
            spacing_m,
            curvature: 0.0,
            speed_mps: 5.0,
            lateral_offsets: vec![0.0],
            offers: Vec::new(),
            stamp: Duration::ZERO,
        }
    }

    /// Constant curvature (1/m, positive turns left).
    pub fn with_curvature(mut self, curvature: f64) -> Self {
        self.curvature = curvature;
        self
    }

    /// Target speed stored on every waypoint.
    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = speed_mps;
        self
    }

    /// Lateral offsets of the lanes from the centerline (m, positive left).
    pub fn with_lanes(mut self, lateral_offsets: &[f64]) -> Self {
        self.lateral_offsets = lateral_offsets.to_vec();
        self
    }

    /// Flags `waypoints` of `lane` with `flag`.
    pub fn with_offer(mut self, lane: usize, waypoints: Range<usize>, flag: ChangeFlag) -> Self {
        self.offers.push(ChangeOffer { lane, waypoints, flag });
        self
    }

    /// Header stamp of every lane.
    pub fn with_stamp(mut self, stamp: Duration) -> Self {
        self.stamp = stamp;
        self
    }

    /// Reference centerline poses.
    pub fn centerline(&self) -> Vec<Pose> {
        let mut poses = Vec::with_capacity(self.waypoint_count);
        let (mut x, mut y, mut yaw) = (0.0_f64, 0.0_f64, 0.0_f64);

        for _ in 0..self.waypoint_count {
            poses.push(geometry::pose_from_xy_yaw(x, y, yaw));
            // Midpoint rule keeps the arc on the circle for small steps
            let mid = yaw + 0.5 * self.curvature * self.spacing_m;
            x += self.spacing_m * mid.cos();
            y += self.spacing_m * mid.sin();
            yaw += self.curvature * self.spacing_m;
        }
        poses
    }

    pub fn build(&self) -> Result<LaneArray, SimError> {
        if self.spacing_m <= 0.0 {
            return Err(SimError::InvalidRoad(format!(
                "waypoint spacing must be positive, got {}",
                self.spacing_m
            )));
        }
        for offer in &self.offers {
            if offer.lane >= self.lateral_offsets.len() || offer.waypoints.end > self.waypoint_count {
                return Err(SimError::InvalidRoad(format!(
                    "offer {:?} outside a road of {} lanes x {} waypoints",
                    offer,
                    self.lateral_offsets.len(),
                    self.waypoint_count
                )));
            }
        }

        let centerline = self.centerline();
        let header = Header::map(self.stamp);

        let lanes = self
            .lateral_offsets
            .iter()
            .enumerate()
            .map(|(lane_index, &offset)| {
                let waypoints = centerline
                    .iter()
                    .enumerate()
                    .map(|(i, center)| {
                        let p = geometry::to_world(&Point3::new(0.0, offset, 0.0), center);
                        let pose = geometry::pose_from_xy_yaw(p.x, p.y, geometry::yaw(center));
                        Waypoint::new(pose, self.speed_mps).with_flag(self.flag_at(lane_index, i))
                    })
                    .collect();
                Lane::new(header.clone(), waypoints)
            })
            .collect();

        Ok(LaneArray::new(lanes))
    }

    fn flag_at(&self, lane: usize, index: usize) -> ChangeFlag {
        self.offers
            .iter()
            .rev()
            .find(|o| o.lane == lane && o.waypoints.contains(&index))
            .map_or(ChangeFlag::Straight, |o| o.flag)
    }
}
