//! Waypoint search: closest waypoint ahead of the vehicle, first change
//! offer, and distance look-ahead along a lane.

use crate::error::LaneSelectError;
use crate::geometry::{self, Pose};
use crate::lane::Lane;
use tracing::warn;

/// Look-ahead window, in waypoints per m/s of forward speed.
const WINDOW_SPEED_RATIO: f64 = 3.0;

/// Look-ahead window lower bound, in waypoints.
const WINDOW_MINIMUM: f64 = 5.0;

/// Waypoints whose heading differs from the vehicle by this much or more are ignored.
const HEADING_CONE_DEG: f64 = 90.0;

/// Number of waypoints searched after a known previous index.
pub fn search_window(velocity: f64) -> f64 {
    (velocity * WINDOW_SPEED_RATIO).max(WINDOW_MINIMUM)
}

/// True if the waypoint at `index` lies strictly in front of `pose` and
/// points roughly the same way.
fn is_ahead(lane: &Lane, index: usize, pose: &Pose) -> bool {
    let waypoint = &lane.waypoints[index];
    let local = geometry::to_local(&waypoint.position(), pose);
    local.x > 0.0 && geometry::relative_angle_deg(&waypoint.pose, pose) < HEADING_CONE_DEG
}

/// Finds the index of the closest waypoint ahead of the vehicle.
///
/// Without a previous index the whole lane is scanned. With one, the vehicle
/// must still be within `2 * distance_threshold` of that waypoint (otherwise
/// the lane is considered lost and `None` is returned), and only a
/// speed-scaled window starting at it is searched.
///
/// # Errors
/// `IndexOutOfBounds` if `previous` does not address a waypoint of `lane`.
pub fn find_closest_ahead(
    lane: &Lane,
    pose: &Pose,
    velocity: f64,
    previous: Option<usize>,
    distance_threshold: f64,
) -> Result<Option<usize>, LaneSelectError> {
    if lane.is_empty() {
        return Ok(None);
    }

    let vehicle = geometry::position(pose);

    let range = match previous {
        None => 0..lane.len(),
        Some(prev) => {
            let anchor = lane.waypoint(prev)?;
            let drift = geometry::planar_distance(&anchor.position(), &vehicle);
            if drift > distance_threshold * 2.0 {
                warn!(
                    "Vehicle is {:.2}m away from previous closest waypoint {}, re-initializing",
                    drift, prev
                );
                return Ok(None);
            }

            let end = ((prev as f64 + search_window(velocity)) as usize).min(lane.len());
            prev..end
        }
    };

    let closest = range
        .filter(|&i| is_ahead(lane, i, pose))
        .map(|i| (i, geometry::planar_distance(&vehicle, &lane.waypoints[i].position())))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i);

    Ok(closest)
}

/// Lowest index at or after `from` whose waypoint offers a lane change.
pub fn first_change_offer(lane: &Lane, from: usize) -> Option<usize> {
    (from..lane.len()).find(|&i| lane.waypoints[i].change_flag.is_change_offer())
}

/// First index at or after `start` whose planar distance from the waypoint
/// at `start` is at least `distance`; the last index if the lane ends first.
pub fn find_waypoint_ahead(lane: &Lane, start: usize, distance: f64) -> Option<usize> {
    let origin = lane.get(start)?.position();
    let last = lane.last_index()?;

    (start..lane.len()).find(|&i| {
        i == last || geometry::planar_distance(&origin, &lane.waypoints[i].position()) >= distance
    })
}
