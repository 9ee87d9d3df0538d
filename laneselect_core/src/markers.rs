//! Debug visualization primitives.
//!
//! One marker per namespace is emitted every processed tick; a namespace
//! with nothing to show gets a `Delete` marker so stale drawings disappear.

use crate::decision::CommandedState;
use crate::lane::{ChangeFlag, Lane};
use crate::lane_change::LaneForChange;
use crate::lane_registry::{LaneId, LaneRegistry};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// RGBA color, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

const CURRENT: Color = Color::rgba(0.0, 0.7, 1.0, 1.0);
const GREY: Color = Color::rgba(0.5, 0.5, 0.5, 1.0);
const NEIGHBOR_ACTIVE: Color = Color::rgba(0.0, 1.0, 0.7, 1.0);
const CHANGE_PENDING: Color = Color::rgba(1.0, 0.0, 0.0, 0.7);
const CLOSEST: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

/// Line width / point size of lane polylines (m).
const LINE_SCALE: f64 = 0.1;
/// Size of closest-waypoint points (m).
const POINT_SCALE: f64 = 0.5;
/// The change trajectory is drawn slightly below the lanes it overlaps.
const CHANGE_LANE_Z_OFFSET: f64 = -0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    LineStrip,
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerAction {
    Add,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub namespace: String,
    pub kind: MarkerKind,
    pub action: MarkerAction,
    pub scale: f64,
    pub color: Color,
    pub points: Vec<Point3<f64>>,
}

impl Marker {
    fn delete(namespace: &str, kind: MarkerKind) -> Self {
        Self {
            namespace: namespace.to_string(),
            kind,
            action: MarkerAction::Delete,
            scale: 0.0,
            color: Color::rgba(0.0, 0.0, 0.0, 0.0),
            points: Vec::new(),
        }
    }

    fn line_strip(namespace: &str, color: Color, points: Vec<Point3<f64>>) -> Self {
        Self {
            namespace: namespace.to_string(),
            kind: MarkerKind::LineStrip,
            action: MarkerAction::Add,
            scale: LINE_SCALE,
            color,
            points,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerArray {
    pub markers: Vec<Marker>,
}

impl MarkerArray {
    /// Marker of a namespace, if present.
    pub fn get(&self, namespace: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.namespace == namespace)
    }
}

fn lane_marker(namespace: &str, lane: Option<&Lane>, color: Color) -> Marker {
    match lane {
        Some(lane) if !lane.is_empty() => Marker::line_strip(namespace, color, lane.polyline()),
        _ => Marker::delete(namespace, MarkerKind::LineStrip),
    }
}

fn neighbor_marker(
    namespace: &str,
    registry: &LaneRegistry,
    id: Option<LaneId>,
    side: ChangeFlag,
    published_flag: ChangeFlag,
) -> Marker {
    let lane = id.and_then(|id| registry.get(id).ok()).map(|c| &c.lane);
    let color = if published_flag == side { NEIGHBOR_ACTIVE } else { GREY };
    lane_marker(namespace, lane, color)
}

/// Builds the full marker set for the current tick.
pub fn build_markers(
    registry: &LaneRegistry,
    lane_for_change: &LaneForChange,
    state: CommandedState,
    published_flag: ChangeFlag,
) -> MarkerArray {
    let changing = state == CommandedState::LaneChange;

    let change_lane = if lane_for_change.is_empty() {
        Marker::delete("change_lane_marker", MarkerKind::LineStrip)
    } else {
        let points = lane_for_change
            .lane
            .polyline()
            .into_iter()
            .map(|p| Point3::new(p.x, p.y, p.z + CHANGE_LANE_Z_OFFSET))
            .collect();
        let color = if changing { CURRENT } else { CHANGE_PENDING };
        Marker::line_strip("change_lane_marker", color, points)
    };

    let current = registry.current_candidate().ok().map(|c| &c.lane);
    let current_lane = lane_marker(
        "current_lane_marker",
        current,
        if changing { GREY } else { CURRENT },
    );

    let neighbors = registry.neighbors();
    let right_lane = neighbor_marker(
        "right_lane_marker",
        registry,
        neighbors.right,
        ChangeFlag::Right,
        published_flag,
    );
    let left_lane = neighbor_marker(
        "left_lane_marker",
        registry,
        neighbors.left,
        ChangeFlag::Left,
        published_flag,
    );

    let closest_points = registry
        .candidates()
        .iter()
        .filter_map(|c| c.closest_waypoint().ok().flatten())
        .map(|w| w.position())
        .collect();
    let closest = Marker {
        namespace: "closest_waypoints_marker".to_string(),
        kind: MarkerKind::Points,
        action: MarkerAction::Add,
        scale: POINT_SCALE,
        color: CLOSEST,
        points: closest_points,
    };

    MarkerArray {
        markers: vec![change_lane, current_lane, right_lane, left_lane, closest],
    }
}
