//! Cubic Hermite connector between two poses.
//!
//! The curve leaves `start` along its heading and arrives at `end` along its
//! heading, so position and tangent direction are continuous at both joins.

use crate::geometry::{self, Pose};
use crate::lane::Waypoint;
use nalgebra::{Point3, Vector2};

/// Planar cubic Hermite segment with linear height interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct HermiteCurve {
    p0: Vector2<f64>,
    p1: Vector2<f64>,
    m0: Vector2<f64>,
    m1: Vector2<f64>,
    z0: f64,
    z1: f64,
}

impl HermiteCurve {
    /// Curve from `start` to `end` with tangents along each pose's heading.
    ///
    /// Tangent magnitude is the chord length, which keeps the curve free of
    /// loops for the mild heading changes of a lane change.
    pub fn between(start: &Pose, end: &Pose) -> Self {
        let a = geometry::position(start);
        let b = geometry::position(end);
        let chord = geometry::planar_distance(&a, &b);

        let tangent = |pose: &Pose| {
            let yaw = geometry::yaw(pose);
            Vector2::new(yaw.cos(), yaw.sin()) * chord
        };

        Self {
            p0: a.xy().coords,
            p1: b.xy().coords,
            m0: tangent(start),
            m1: tangent(end),
            z0: a.z,
            z1: b.z,
        }
    }

    /// Point at parameter `t` in `[0, 1]`.
    pub fn position(&self, t: f64) -> Point3<f64> {
        let t2 = t * t;
        let t3 = t2 * t;
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        let xy = self.p0 * h00 + self.m0 * h10 + self.p1 * h01 + self.m1 * h11;
        Point3::new(xy.x, xy.y, self.z0 + (self.z1 - self.z0) * t)
    }

    /// Heading (yaw, radians) of the curve at parameter `t`.
    pub fn heading(&self, t: f64) -> f64 {
        let t2 = t * t;
        let d00 = 6.0 * t2 - 6.0 * t;
        let d10 = 3.0 * t2 - 4.0 * t + 1.0;
        let d01 = -6.0 * t2 + 6.0 * t;
        let d11 = 3.0 * t2 - 2.0 * t;

        let d = self.p0 * d00 + self.m0 * d10 + self.p1 * d01 + self.m1 * d11;
        d.y.atan2(d.x)
    }

    /// `count` waypoints strictly between the endpoints, evenly spaced in
    /// the curve parameter, all at `velocity`.
    pub fn sample(&self, count: usize, velocity: f64) -> Vec<Waypoint> {
        (1..=count)
            .map(|k| {
                let t = k as f64 / (count + 1) as f64;
                let p = self.position(t);
                Waypoint::new(geometry::pose_from_xyz_yaw(p.x, p.y, p.z, self.heading(t)), velocity)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::pose_from_xy_yaw;
    use approx::assert_relative_eq;

    #[test]
    fn test_endpoints_match() {
        let start = pose_from_xy_yaw(0.0, 0.0, 0.0);
        let end = pose_from_xy_yaw(20.0, -3.0, 0.0);
        let curve = HermiteCurve::between(&start, &end);

        assert_relative_eq!(curve.position(0.0), Point3::new(0.0, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(curve.position(1.0), Point3::new(20.0, -3.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(curve.heading(0.0), 0.0, epsilon = 1e-9);
        assert_relative_eq!(curve.heading(1.0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lane_change_curve_is_monotone() {
        let start = pose_from_xy_yaw(0.0, 0.0, 0.0);
        let end = pose_from_xy_yaw(20.0, -3.0, 0.0);
        let samples = HermiteCurve::between(&start, &end).sample(10, 4.0);

        assert_eq!(samples.len(), 10);
        let xs: Vec<f64> = samples.iter().map(|w| w.position().x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert!(xs.iter().all(|&x| x > 0.0 && x < 20.0));

        // Drifts right the whole way
        let ys: Vec<f64> = samples.iter().map(|w| w.position().y).collect();
        assert!(ys.windows(2).all(|w| w[0] > w[1]));
        assert!(samples.iter().all(|w| w.velocity == 4.0));
    }

    #[test]
    fn test_zero_samples() {
        let start = pose_from_xy_yaw(0.0, 0.0, 0.0);
        let end = pose_from_xy_yaw(10.0, 3.0, 0.0);
        assert!(HermiteCurve::between(&start, &end).sample(0, 1.0).is_empty());
    }
}
