//! Geometry primitives: planar distance, pose-relative transforms and
//! heading comparison.
//!
//! Poses are full 3D rigid transforms (`Isometry3`) as delivered by the
//! localization stack; every metric here is evaluated in the XY plane.

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

/// Position + orientation of a waypoint or of the vehicle.
pub type Pose = Isometry3<f64>;

/// Distance between two points ignoring the z coordinate.
pub fn planar_distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a.xy() - b.xy()).norm()
}

/// Position of a pose as a point.
#[inline]
pub fn position(pose: &Pose) -> Point3<f64> {
    Point3::from(pose.translation.vector)
}

/// Expresses a world point in the local frame of `pose` (x forward, y left).
pub fn to_local(point: &Point3<f64>, pose: &Pose) -> Point3<f64> {
    pose.inverse_transform_point(point)
}

/// Inverse of [`to_local`]: maps a point given in the frame of `pose` back
/// to the world frame.
pub fn to_world(point: &Point3<f64>, pose: &Pose) -> Point3<f64> {
    pose.transform_point(point)
}

/// Angle in degrees between the heading (local x axis) of two poses.
///
/// Always in `[0, 180]`.
pub fn relative_angle_deg(a: &Pose, b: &Pose) -> f64 {
    let heading_a = a.rotation * Vector3::x();
    let heading_b = b.rotation * Vector3::x();
    heading_a.angle(&heading_b).to_degrees()
}

/// Yaw of a pose in radians.
pub fn yaw(pose: &Pose) -> f64 {
    pose.rotation.euler_angles().2
}

/// Builds a planar pose from position and yaw.
pub fn pose_from_xy_yaw(x: f64, y: f64, yaw: f64) -> Pose {
    pose_from_xyz_yaw(x, y, 0.0, yaw)
}

/// Builds a pose from position and yaw, keeping the given height.
pub fn pose_from_xyz_yaw(x: f64, y: f64, z: f64, yaw: f64) -> Pose {
    Isometry3::from_parts(
        Translation3::new(x, y, z),
        UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
    )
}

/// Implicit line `a*x + b*y + c = 0` through two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineEquation {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl LineEquation {
    /// Points closer than this on both axes are considered identical.
    const COINCIDENT_EPSILON: f64 = 1e-5;

    /// Line through `start` and `end`; `None` when the points coincide.
    pub fn through(start: &Point3<f64>, end: &Point3<f64>) -> Option<Self> {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        if dx.abs() < Self::COINCIDENT_EPSILON && dy.abs() < Self::COINCIDENT_EPSILON {
            return None;
        }

        Some(Self {
            a: dy,
            b: -dx,
            c: -dy * start.x + dx * start.y,
        })
    }

    /// Perpendicular planar distance from `point` to the line.
    pub fn distance_to(&self, point: &Point3<f64>) -> f64 {
        (self.a * point.x + self.b * point.y + self.c).abs() / self.a.hypot(self.b)
    }
}
