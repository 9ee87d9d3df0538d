//! Ground truth vehicle for closed-loop runs.
//!
//! The vehicle drives along whatever lane the selector last published, at a
//! constant speed, and reports its pose with Gaussian noise:
//! - Path following: arc-length advance along the published polyline
//! - Re-anchoring: on a new lane, the vehicle snaps to its projection
//! - Measurement: noisy pose from a seeded RNG

use laneselect_core::geometry::{self, LineEquation, Pose};
use laneselect_core::Lane;
use nalgebra::{Point3, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, warn};

/// The ground-truth vehicle.
pub struct VehicleOracle {
    /// RNG for measurement noise
    rng: ChaCha8Rng,

    /// Position noise, `None` for perfect measurements
    noise: Option<Normal<f64>>,

    /// Polyline being followed
    path: Vec<Point3<f64>>,

    /// Segment `path[segment] -> path[segment + 1]` the vehicle is on
    segment: usize,

    /// Distance travelled into the current segment (m)
    along: f64,

    /// Forward speed (m/s)
    speed: f64,

    /// Simulated time (s)
    time: f64,
}

impl VehicleOracle {
    /// Places the vehicle on waypoint `start` of `lane`.
    pub fn new(seed: u64, position_noise_std: f64, lane: &Lane, start: usize, speed: f64) -> Self {
        let noise = if position_noise_std > 0.0 {
            match Normal::new(0.0, position_noise_std) {
                Ok(normal) => Some(normal),
                Err(e) => {
                    warn!("Invalid pose noise {}: {}, using perfect poses", position_noise_std, e);
                    None
                }
            }
        } else {
            None
        };

        let path = lane.polyline();
        let segment = start.min(path.len().saturating_sub(2));

        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            noise,
            path,
            segment,
            along: 0.0,
            speed,
            time: 0.0,
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    /// True once the vehicle reached the end of its path.
    pub fn at_end(&self) -> bool {
        self.path.len() < 2
            || (self.segment + 2 >= self.path.len() && self.along >= self.segment_length(self.segment))
    }

    /// Path length left ahead of the vehicle (m).
    pub fn remaining_distance(&self) -> f64 {
        let ahead: f64 = (self.segment..self.path.len().saturating_sub(1))
            .map(|i| self.segment_length(i))
            .sum();
        (ahead - self.along).max(0.0)
    }

    fn segment_length(&self, segment: usize) -> f64 {
        match (self.path.get(segment), self.path.get(segment + 1)) {
            (Some(a), Some(b)) => geometry::planar_distance(a, b),
            _ => 0.0,
        }
    }

    /// Switches to a newly published lane, continuing from the closest
    /// point on it.
    pub fn follow(&mut self, lane: &Lane) {
        let path = lane.polyline();
        if path.len() < 2 {
            warn!("Ignoring lane with {} waypoints", path.len());
            return;
        }

        let here = self.true_position();
        let mut best = (0, 0.0, f64::INFINITY);
        for (i, pair) in path.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let ab = b.xy() - a.xy();
            let len_sq = ab.norm_squared();
            let t = if len_sq > 0.0 {
                ((here.xy() - a.xy()).dot(&ab) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let projected = a.xy() + ab * t;
            let distance = (here.xy() - projected).norm();
            if distance < best.2 {
                best = (i, t * len_sq.sqrt(), distance);
            }
        }

        debug!(
            "Following new lane of {} waypoints from segment {} ({:.2}m off)",
            path.len(),
            best.0,
            best.2
        );
        self.path = path;
        self.segment = best.0;
        self.along = best.1;
    }

    /// Advances the vehicle by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.time += dt;
        if self.path.len() < 2 {
            return;
        }

        self.along += self.speed * dt;
        loop {
            let length = self.segment_length(self.segment);
            if self.along < length || self.segment + 2 >= self.path.len() {
                self.along = self.along.min(length);
                break;
            }
            self.along -= length;
            self.segment += 1;
        }
    }

    /// Exact position.
    pub fn true_position(&self) -> Point3<f64> {
        let Some(&start) = self.path.get(self.segment) else {
            return Point3::origin();
        };
        let Some(&end) = self.path.get(self.segment + 1) else {
            return start;
        };

        let length = geometry::planar_distance(&start, &end);
        if length <= 0.0 {
            return start;
        }
        start + (end - start) * (self.along / length)
    }

    fn heading(&self) -> f64 {
        match (self.path.get(self.segment), self.path.get(self.segment + 1)) {
            (Some(a), Some(b)) => (b.y - a.y).atan2(b.x - a.x),
            _ => 0.0,
        }
    }

    /// Exact pose.
    pub fn true_pose(&self) -> Pose {
        let p = self.true_position();
        geometry::pose_from_xyz_yaw(p.x, p.y, p.z, self.heading())
    }

    /// Pose as reported by the localization stack.
    pub fn measured_pose(&mut self) -> Pose {
        let p = self.true_position();
        let offset = match &self.noise {
            Some(normal) => Vector3::new(
                normal.sample(&mut self.rng),
                normal.sample(&mut self.rng),
                0.0,
            ),
            None => Vector3::zeros(),
        };
        geometry::pose_from_xyz_yaw(p.x + offset.x, p.y + offset.y, p.z, self.heading())
    }

    /// Lateral distance between the vehicle and `lane`, measured against
    /// the lane segment next to its nearest waypoint.
    pub fn cross_track_error(&self, lane: &Lane) -> Option<f64> {
        let here = self.true_position();
        let nearest = lane
            .waypoints
            .iter()
            .enumerate()
            .map(|(i, w)| (i, geometry::planar_distance(&here, &w.position())))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)?;

        let (a, b) = if nearest + 1 < lane.len() {
            (nearest, nearest + 1)
        } else {
            (nearest.checked_sub(1)?, nearest)
        };
        let line = LineEquation::through(&lane.waypoints[a].position(), &lane.waypoints[b].position())?;
        Some(line.distance_to(&here))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::road::RoadBuilder;
    use approx::assert_relative_eq;

    #[test]
    fn test_drives_along_lane() {
        let lanes = RoadBuilder::new(20, 1.0).build().unwrap();
        let mut oracle = VehicleOracle::new(42, 0.0, &lanes.lanes[0], 2, 2.0);

        oracle.step(1.5);
        assert_relative_eq!(oracle.true_position().x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(oracle.remaining_distance(), 14.0, epsilon = 1e-9);
        assert_relative_eq!(oracle.time(), 1.5);

        // Stops at the end of the lane
        oracle.step(100.0);
        assert!(oracle.at_end());
        assert_relative_eq!(oracle.true_position().x, 19.0, epsilon = 1e-9);
    }

    #[test]
    fn test_follow_projects_onto_new_lane() {
        let lanes = RoadBuilder::new(20, 1.0).with_lanes(&[0.0, -3.0]).build().unwrap();
        let mut oracle = VehicleOracle::new(42, 0.0, &lanes.lanes[0], 4, 1.0);
        oracle.step(0.5);

        oracle.follow(&lanes.lanes[1]);
        let p = oracle.true_position();
        assert_relative_eq!(p.x, 4.5, epsilon = 1e-9);
        assert_relative_eq!(p.y, -3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cross_track_error() {
        let lanes = RoadBuilder::new(20, 1.0).with_lanes(&[0.0, -3.0]).build().unwrap();
        let oracle = VehicleOracle::new(42, 0.0, &lanes.lanes[0], 5, 1.0);

        assert_relative_eq!(oracle.cross_track_error(&lanes.lanes[0]).unwrap(), 0.0);
        assert_relative_eq!(oracle.cross_track_error(&lanes.lanes[1]).unwrap(), 3.0);
    }

    #[test]
    fn test_noise_is_seeded() {
        let lanes = RoadBuilder::new(20, 1.0).build().unwrap();
        let mut a = VehicleOracle::new(7, 0.3, &lanes.lanes[0], 5, 1.0);
        let mut b = VehicleOracle::new(7, 0.3, &lanes.lanes[0], 5, 1.0);

        for _ in 0..5 {
            assert_eq!(a.measured_pose(), b.measured_pose());
        }
        assert!(a.measured_pose() != a.true_pose());
    }
}
