//! Neighbor lane resolver: classifies candidate lanes as left or right of
//! the current lane.

use crate::error::LaneSelectError;
use crate::geometry;
use crate::lane::ChangeFlag;
use crate::lane_registry::{select_nearest, LaneCandidate, LaneId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Nearest usable lane on each side of the current lane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborLanes {
    pub right: Option<LaneId>,
    pub left: Option<LaneId>,
}

impl NeighborLanes {
    /// Neighbor on the side a change flag points to.
    pub fn side(&self, flag: ChangeFlag) -> Option<LaneId> {
        match flag {
            ChangeFlag::Right => self.right,
            ChangeFlag::Left => self.left,
            ChangeFlag::Straight | ChangeFlag::Unknown => None,
        }
    }
}

/// Classifies every other associated candidate by its lateral offset in the
/// frame of the current lane's closest waypoint.
///
/// Candidates more than `distance_threshold` to the side are ignored; an
/// offset of exactly zero belongs to neither side. Per side the candidate
/// nearest to the current closest waypoint wins.
pub fn classify_neighbors(
    candidates: &[LaneCandidate],
    current: LaneId,
    distance_threshold: f64,
) -> Result<NeighborLanes, LaneSelectError> {
    let current_candidate = candidates
        .iter()
        .find(|c| c.id == current)
        .ok_or(LaneSelectError::NoCurrentLane)?;
    let Some(reference) = current_candidate.closest_waypoint()? else {
        return Ok(NeighborLanes::default());
    };

    let mut right = Vec::new();
    let mut left = Vec::new();

    for candidate in candidates.iter().filter(|c| c.id != current) {
        let Some(waypoint) = candidate.closest_waypoint()? else {
            continue;
        };

        let lateral = geometry::to_local(&waypoint.position(), &reference.pose).y;
        if lateral.abs() > distance_threshold {
            debug!("lane {} is {:.2}m to the side, too far", candidate.id, lateral);
            continue;
        }

        if lateral > 0.0 {
            left.push(candidate);
        } else if lateral < 0.0 {
            right.push(candidate);
        }
    }

    let origin = reference.position();
    Ok(NeighborLanes {
        right: select_nearest(right, &origin)?,
        left: select_nearest(left, &origin)?,
    })
}
