//! Lane registry: the per-tick set of candidate lanes, their tracked closest
//! waypoints and change flags, and the current/left/right selection.

use crate::config::LaneSelectConfig;
use crate::error::LaneSelectError;
use crate::geometry::{self, Pose};
use crate::lane::{ChangeFlag, Lane, LaneArray, Waypoint};
use crate::neighbor_lanes::{classify_neighbors, NeighborLanes};
use crate::waypoint_search::find_closest_ahead;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Stable identifier of a candidate lane.
///
/// `generation` counts lane-array replacements, so an id never aliases a
/// lane from an older array even when the positions coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LaneId {
    pub generation: u64,
    pub index: usize,
}

impl std::fmt::Display for LaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.generation, self.index)
    }
}

/// Tracking record for one candidate lane.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneCandidate {
    pub id: LaneId,
    pub lane: Lane,

    /// Closest waypoint ahead, `None` when the vehicle cannot be associated
    pub closest_index: Option<usize>,

    /// Change flag derived for the closest waypoint this tick
    pub change_flag: ChangeFlag,
}

impl LaneCandidate {
    /// The waypoint at `closest_index`, if any.
    pub fn closest_waypoint(&self) -> Result<Option<&Waypoint>, LaneSelectError> {
        self.closest_index
            .map(|i| self.lane.waypoint(i))
            .transpose()
    }
}

/// Among candidates with a closest waypoint, the one whose closest waypoint
/// is nearest to `point`. Ties go to the first candidate encountered.
pub fn select_nearest<'a>(
    candidates: impl IntoIterator<Item = &'a LaneCandidate>,
    point: &Point3<f64>,
) -> Result<Option<LaneId>, LaneSelectError> {
    let mut best: Option<(LaneId, f64)> = None;

    for candidate in candidates {
        let Some(waypoint) = candidate.closest_waypoint()? else {
            continue;
        };
        let distance = geometry::planar_distance(point, &waypoint.position());
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((candidate.id, distance));
        }
    }

    Ok(best.map(|(id, _)| id))
}

/// Picks the current lane: the candidate whose closest waypoint is nearest
/// to the vehicle.
pub fn select_current_lane(
    candidates: &[LaneCandidate],
    pose: &Pose,
) -> Result<Option<LaneId>, LaneSelectError> {
    select_nearest(candidates, &geometry::position(pose))
}

/// Holds the candidate lanes of the latest lane array.
#[derive(Debug, Clone, Default)]
pub struct LaneRegistry {
    generation: u64,
    candidates: Vec<LaneCandidate>,
    current: Option<LaneId>,
    neighbors: NeighborLanes,
}

impl LaneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every candidate with the lanes of `array`.
    ///
    /// All tracked indices and the current/left/right selection are reset.
    pub fn replace_lanes(&mut self, array: LaneArray) {
        self.generation += 1;
        let generation = self.generation;

        self.candidates = array
            .lanes
            .into_iter()
            .enumerate()
            .map(|(index, lane)| LaneCandidate {
                id: LaneId { generation, index },
                lane,
                closest_index: None,
                change_flag: ChangeFlag::Straight,
            })
            .collect();

        self.clear_selection();
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn candidates(&self) -> &[LaneCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    fn check(&self, id: LaneId) -> Result<usize, LaneSelectError> {
        if id.generation != self.generation || id.index >= self.candidates.len() {
            return Err(LaneSelectError::StaleLaneId {
                id,
                generation: self.generation,
            });
        }
        Ok(id.index)
    }

    pub fn get(&self, id: LaneId) -> Result<&LaneCandidate, LaneSelectError> {
        let index = self.check(id)?;
        Ok(&self.candidates[index])
    }

    pub fn get_mut(&mut self, id: LaneId) -> Result<&mut LaneCandidate, LaneSelectError> {
        let index = self.check(id)?;
        Ok(&mut self.candidates[index])
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    pub fn current(&self) -> Option<LaneId> {
        self.current
    }

    pub fn neighbors(&self) -> NeighborLanes {
        self.neighbors
    }

    /// The selected current lane.
    pub fn current_candidate(&self) -> Result<&LaneCandidate, LaneSelectError> {
        let id = self.current.ok_or(LaneSelectError::NoCurrentLane)?;
        self.get(id)
    }

    pub fn current_candidate_mut(&mut self) -> Result<&mut LaneCandidate, LaneSelectError> {
        let id = self.current.ok_or(LaneSelectError::NoCurrentLane)?;
        self.get_mut(id)
    }

    pub fn clear_selection(&mut self) {
        self.current = None;
        self.neighbors = NeighborLanes::default();
    }

    /// Re-runs current-lane selection and neighbor classification.
    ///
    /// Returns the new current lane; `None` clears the neighbors too.
    pub fn select_lanes(
        &mut self,
        pose: &Pose,
        distance_threshold: f64,
    ) -> Result<Option<LaneId>, LaneSelectError> {
        self.current = select_current_lane(&self.candidates, pose)?;
        self.neighbors = match self.current {
            Some(current) => classify_neighbors(&self.candidates, current, distance_threshold)?,
            None => NeighborLanes::default(),
        };
        Ok(self.current)
    }

    /// True if the neighbor on the side of `flag` is selected and still
    /// associated with the vehicle this tick.
    pub fn has_live_neighbor(&self, flag: ChangeFlag) -> bool {
        self.neighbors
            .side(flag)
            .and_then(|id| self.get(id).ok())
            .is_some_and(|candidate| candidate.closest_index.is_some())
    }

    // ------------------------------------------------------------------------
    // Per-tick recomputation
    // ------------------------------------------------------------------------

    /// Updates every candidate's closest waypoint.
    ///
    /// Returns `false` if no candidate could be associated with the vehicle
    /// (total localization loss). An empty registry also reports loss.
    pub fn recompute_closest_for_all(
        &mut self,
        pose: &Pose,
        velocity: f64,
        config: &LaneSelectConfig,
    ) -> Result<bool, LaneSelectError> {
        for candidate in &mut self.candidates {
            candidate.closest_index = find_closest_ahead(
                &candidate.lane,
                pose,
                velocity,
                candidate.closest_index,
                config.distance_threshold,
            )?;
            debug!("lane {} closest: {:?}", candidate.id, candidate.closest_index);
        }

        let localized = self.candidates.iter().any(|c| c.closest_index.is_some());
        if !localized {
            warn!("Cannot get closest waypoints. All closest waypoints are reset");
        }
        Ok(localized)
    }

    /// Change flag to report for `lane` at `closest`.
    ///
    /// The waypoint's own flag, except that a `Right`/`Left` offer without a
    /// live neighbor on that side degrades to `Unknown`, as does a missing
    /// closest index.
    pub fn change_flag_for(
        &self,
        lane: &Lane,
        closest: Option<usize>,
    ) -> Result<ChangeFlag, LaneSelectError> {
        let Some(index) = closest else {
            return Ok(ChangeFlag::Unknown);
        };

        let flag = lane.waypoint(index)?.change_flag;
        if flag.is_change_offer() && !self.has_live_neighbor(flag) {
            return Ok(ChangeFlag::Unknown);
        }
        Ok(flag)
    }

    /// Recomputes every candidate's change flag.
    pub fn refresh_change_flags(&mut self) -> Result<(), LaneSelectError> {
        let flags = self
            .candidates
            .iter()
            .map(|c| self.change_flag_for(&c.lane, c.closest_index))
            .collect::<Result<Vec<_>, _>>()?;

        for (candidate, flag) in self.candidates.iter_mut().zip(flags) {
            debug!("lane {} change_flag: {}", candidate.id, flag.code());
            candidate.change_flag = flag;
        }
        Ok(())
    }
}
