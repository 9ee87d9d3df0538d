//! Lane-change trajectory synthesis.
//!
//! The blended lane is built in three parts:
//!
//! ```text
//!  current lane  ──●──●──●──[exit]╮
//!                                  ╰─ connector (Hermite) ─╮
//!  target lane                              ──[entry]──●──●──●──▶
//! ```
//!
//! 1. Exit: current-lane waypoints from the closest one up to the change
//!    offer plus a speed-scaled straight run.
//! 2. Connector: Hermite samples from the exit point to the entry point.
//! 3. Entry: target-lane waypoints from the entry point to the lane end.

use crate::config::LaneSelectConfig;
use crate::error::LaneSelectError;
use crate::geometry::{self, Pose};
use crate::hermite::HermiteCurve;
use crate::lane::{ChangeFlag, Lane};
use crate::lane_registry::LaneRegistry;
use crate::waypoint_search::{find_waypoint_ahead, first_change_offer};
use thiserror::Error;
use tracing::{debug, info};

/// Change offers farther away than this are not acted on (m).
pub const MAX_CHANGE_OFFER_DISTANCE: f64 = 500.0;

/// Minimum number of waypoints driven straight past the change offer.
pub const MIN_EXIT_OFFSET: usize = 3;

/// The synthesized trajectory and its tracking state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneForChange {
    pub lane: Lane,
    pub closest_index: Option<usize>,
    pub change_flag: ChangeFlag,
}

impl LaneForChange {
    pub fn is_empty(&self) -> bool {
        self.lane.is_empty()
    }

    pub fn clear(&mut self) {
        self.lane.clear();
        self.closest_index = None;
        self.change_flag = ChangeFlag::Straight;
    }

    /// Replaces the trajectory; tracking restarts from scratch.
    pub fn set(&mut self, lane: Lane) {
        self.lane = lane;
        self.closest_index = None;
        self.change_flag = ChangeFlag::Straight;
    }
}

/// Why no trajectory was synthesized this tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthesisSkip {
    #[error("current lane has no closest waypoint")]
    NoClosestWaypoint,

    #[error("current lane doesn't have valid right or left flag")]
    NoChangeOffer,

    #[error("exit run past change offer {offer} (+{offset}) leaves the current lane")]
    ExitBeyondLaneEnd { offer: usize, offset: usize },

    #[error("change offer is {0:.1}m away, too far")]
    OfferTooFar(f64),

    #[error("current lane doesn't have the lane for lane change ({0})")]
    NoNeighbor(ChangeFlag),

    #[error("no entry waypoint found on the target lane")]
    NoEntryWaypoint,

    #[error("entry waypoint {target} (+{interval}) leaves the target lane")]
    EntryBeyondLaneEnd { target: usize, interval: usize },
}

/// Outcome of a synthesis attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Synthesis {
    Built(Lane),
    Skipped(SynthesisSkip),
}

/// Waypoints kept straight on the current lane after the change offer.
pub fn exit_offset(velocity: f64) -> usize {
    let scaled = velocity.round();
    if scaled > MIN_EXIT_OFFSET as f64 {
        scaled as usize
    } else {
        MIN_EXIT_OFFSET
    }
}

/// Builds the blended lane for the next change offered on the current lane.
///
/// Requires a current lane selection in `registry`; everything else that
/// can go wrong is a [`SynthesisSkip`].
pub fn synthesize_lane_change(
    registry: &LaneRegistry,
    pose: &Pose,
    velocity: f64,
    config: &LaneSelectConfig,
) -> Result<Synthesis, LaneSelectError> {
    let current = registry.current_candidate()?;
    let lane = &current.lane;

    let Some(closest) = current.closest_index else {
        return Ok(Synthesis::Skipped(SynthesisSkip::NoClosestWaypoint));
    };
    let Some(offer) = first_change_offer(lane, closest) else {
        return Ok(Synthesis::Skipped(SynthesisSkip::NoChangeOffer));
    };
    debug!("change offer at waypoint {}", offer);

    // Exit run
    let offset = exit_offset(velocity);
    let Some(exit) = offer
        .checked_add(offset)
        .filter(|&exit| lane.last_index().is_some_and(|last| exit <= last))
    else {
        return Ok(Synthesis::Skipped(SynthesisSkip::ExitBeyondLaneEnd { offer, offset }));
    };

    let offer_waypoint = lane.waypoint(offer)?;
    let offer_distance =
        geometry::planar_distance(&offer_waypoint.position(), &geometry::position(pose));
    if offer_distance > MAX_CHANGE_OFFER_DISTANCE {
        return Ok(Synthesis::Skipped(SynthesisSkip::OfferTooFar(offer_distance)));
    }

    let flag = offer_waypoint.change_flag;
    let Some(target_id) = registry.neighbors().side(flag) else {
        return Ok(Synthesis::Skipped(SynthesisSkip::NoNeighbor(flag)));
    };
    let target = registry.get(target_id)?;
    let Some(target_closest) = target.closest_index else {
        return Ok(Synthesis::Skipped(SynthesisSkip::NoNeighbor(flag)));
    };

    // Entry point on the target lane
    let dt = geometry::planar_distance(&offer_waypoint.position(), &lane.waypoint(closest)?.position());
    let dt_by_vel = (velocity * config.lane_change_target_ratio).max(config.lane_change_target_minimum);
    debug!("dt: {:.2}, dt_by_vel: {:.2}", dt, dt_by_vel);

    let Some(entry) = find_waypoint_ahead(&target.lane, target_closest, dt + dt_by_vel) else {
        return Ok(Synthesis::Skipped(SynthesisSkip::NoEntryWaypoint));
    };
    let interval = config.lane_change_interval_waypoints();
    let entry_end = entry.checked_add(interval);
    if !entry_end.is_some_and(|end| target.lane.last_index().is_some_and(|last| end <= last)) {
        return Ok(Synthesis::Skipped(SynthesisSkip::EntryBeyondLaneEnd {
            target: entry,
            interval,
        }));
    }

    // Assemble
    let exit_waypoint = lane.waypoint(exit)?;
    let entry_waypoint = target.lane.waypoint(entry)?;
    let connector = HermiteCurve::between(&exit_waypoint.pose, &entry_waypoint.pose)
        .sample(config.hermite_curve_sample_count, exit_waypoint.velocity);

    let mut waypoints = Vec::with_capacity(
        exit - closest + 1 + connector.len() + target.lane.len() - entry,
    );

    waypoints.extend_from_slice(&lane.waypoints[closest..exit]);
    let committed = waypoints.len() - offset;
    for waypoint in &mut waypoints[committed..] {
        waypoint.change_flag = flag;
    }

    waypoints.push(exit_waypoint.clone().with_flag(flag));
    waypoints.extend(connector.into_iter().map(|w| w.with_flag(flag)));

    waypoints.extend(
        target.lane.waypoints[entry..]
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let marker = if i < interval { flag } else { ChangeFlag::Straight };
                w.clone().with_flag(marker)
            }),
    );

    info!(
        "Lane change {} prepared: lane {} [{}..{}] -> lane {} [{}..] ({} waypoints)",
        flag,
        current.id,
        closest,
        exit,
        target_id,
        entry,
        waypoints.len()
    );

    Ok(Synthesis::Built(Lane::new(target.lane.header.clone(), waypoints)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::pose_from_xy_yaw;
    use crate::lane::{LaneArray, Waypoint};
    use laneselect_env::Header;
    use proptest::prelude::*;
    use std::time::Duration;

    fn lane_at(y: f64, n: usize, stamp_secs: u64) -> Lane {
        let waypoints = (0..n)
            .map(|i| Waypoint::new(pose_from_xy_yaw(i as f64, y, 0.0), 5.0))
            .collect();
        Lane::new(Header::map(Duration::from_secs(stamp_secs)), waypoints)
    }

    /// Two parallel lanes, 3m apart, lane 0 offering a right change at 10.
    fn two_lane_registry(pose: &Pose, velocity: f64, len: usize) -> LaneRegistry {
        let mut current = lane_at(0.0, len, 1);
        current.waypoints[10].change_flag = ChangeFlag::Right;
        let right = lane_at(-3.0, len, 2);

        let mut registry = LaneRegistry::new();
        registry.replace_lanes(LaneArray::new(vec![current, right]));
        registry
            .recompute_closest_for_all(pose, velocity, &LaneSelectConfig::default())
            .unwrap();
        registry.select_lanes(pose, 3.0).unwrap();
        registry
    }

    #[test]
    fn test_synthesizes_right_change() {
        let pose = pose_from_xy_yaw(7.5, 0.0, 0.0);
        let registry = two_lane_registry(&pose, 5.0, 60);
        let config = LaneSelectConfig::default();

        let Synthesis::Built(lane) = synthesize_lane_change(&registry, &pose, 5.0, &config).unwrap()
        else {
            panic!("expected a trajectory");
        };

        // closest = 8, offer = 10, offset = 5 -> exit at 15
        // dt = 2, dt_by_vel = 10 -> entry at target x >= 8 + 12 = 20
        let exit_len = 15 - 8;
        let connector = config.hermite_curve_sample_count;
        assert_eq!(lane.len(), exit_len + 1 + connector + (60 - 20));

        // Stamp comes from the target lane
        assert_eq!(lane.header.stamp, Duration::from_secs(2));

        // Starts on the current lane
        assert_eq!(lane.waypoints[0].position().x, 8.0);
        assert!(lane.waypoints[..2].iter().all(|w| w.change_flag == ChangeFlag::Straight));

        // Committed exit and connector carry the change flag
        let flagged_exit = &lane.waypoints[exit_len - 5..exit_len + 1 + connector];
        assert!(flagged_exit.iter().all(|w| w.change_flag == ChangeFlag::Right));

        // Target entry: first `interval` flagged, rest straight, ends on lane 1
        let entry = &lane.waypoints[exit_len + 1 + connector..];
        assert_eq!(entry[0].position(), nalgebra::Point3::new(20.0, -3.0, 0.0));
        assert!(entry[..10].iter().all(|w| w.change_flag == ChangeFlag::Right));
        assert!(entry[10..].iter().all(|w| w.change_flag == ChangeFlag::Straight));
        assert_eq!(lane.waypoints.last().unwrap().position().y, -3.0);
    }

    #[test]
    fn test_skips_without_neighbor() {
        let pose = pose_from_xy_yaw(7.5, 0.0, 0.0);
        let mut registry = two_lane_registry(&pose, 5.0, 60);
        // Flip the offer to the left where nothing exists
        let current = registry.current_candidate_mut().unwrap();
        current.lane.waypoints[10].change_flag = ChangeFlag::Left;

        let result = synthesize_lane_change(&registry, &pose, 5.0, &LaneSelectConfig::default());
        assert_eq!(
            result,
            Ok(Synthesis::Skipped(SynthesisSkip::NoNeighbor(ChangeFlag::Left)))
        );
    }

    #[test]
    fn test_skips_when_exit_leaves_lane() {
        let pose = pose_from_xy_yaw(7.5, 0.0, 0.0);
        // offer 10 + offset 5 = 15 > last index 14
        let registry = two_lane_registry(&pose, 5.0, 15);

        let result = synthesize_lane_change(&registry, &pose, 5.0, &LaneSelectConfig::default());
        assert_eq!(
            result,
            Ok(Synthesis::Skipped(SynthesisSkip::ExitBeyondLaneEnd { offer: 10, offset: 5 }))
        );
    }

    #[test]
    fn test_skips_when_entry_leaves_target() {
        let pose = pose_from_xy_yaw(7.5, 0.0, 0.0);
        // Entry at 20, 20 + 10 > 25
        let registry = two_lane_registry(&pose, 5.0, 26);

        let result = synthesize_lane_change(&registry, &pose, 5.0, &LaneSelectConfig::default());
        assert_eq!(
            result,
            Ok(Synthesis::Skipped(SynthesisSkip::EntryBeyondLaneEnd { target: 20, interval: 10 }))
        );
    }

    #[test]
    fn test_extreme_speed_skips_instead_of_overflowing() {
        let pose = pose_from_xy_yaw(7.5, 0.0, 0.0);
        let registry = two_lane_registry(&pose, 5.0, 60);

        for velocity in [1e20, f64::INFINITY] {
            let result =
                synthesize_lane_change(&registry, &pose, velocity, &LaneSelectConfig::default());
            assert_eq!(
                result,
                Ok(Synthesis::Skipped(SynthesisSkip::ExitBeyondLaneEnd {
                    offer: 10,
                    offset: usize::MAX,
                }))
            );
        }
    }

    #[test]
    fn test_huge_interval_skips_instead_of_overflowing() {
        let pose = pose_from_xy_yaw(7.5, 0.0, 0.0);
        let registry = two_lane_registry(&pose, 5.0, 60);
        let config = LaneSelectConfig {
            lane_change_interval: f64::MAX,
            ..Default::default()
        };

        let result = synthesize_lane_change(&registry, &pose, 5.0, &config);
        assert_eq!(
            result,
            Ok(Synthesis::Skipped(SynthesisSkip::EntryBeyondLaneEnd {
                target: 20,
                interval: usize::MAX,
            }))
        );
    }

    #[test]
    fn test_skips_far_offer() {
        // 60m spacing puts the offer at x=600
        let spaced = |y: f64| {
            let waypoints = (0..30)
                .map(|i| Waypoint::new(pose_from_xy_yaw(i as f64 * 60.0, y, 0.0), 5.0))
                .collect();
            Lane::new(Header::default(), waypoints)
        };
        let mut current = spaced(0.0);
        current.waypoints[10].change_flag = ChangeFlag::Right;

        let pose = pose_from_xy_yaw(30.0, 0.0, 0.0);
        let mut registry = LaneRegistry::new();
        registry.replace_lanes(LaneArray::new(vec![current, spaced(-3.0)]));
        registry
            .recompute_closest_for_all(&pose, 5.0, &LaneSelectConfig::default())
            .unwrap();
        registry.select_lanes(&pose, 3.0).unwrap();
        assert!(registry.neighbors().right.is_some());

        let result = synthesize_lane_change(&registry, &pose, 5.0, &LaneSelectConfig::default());
        match result {
            Ok(Synthesis::Skipped(SynthesisSkip::OfferTooFar(distance))) => {
                assert!((distance - 570.0).abs() < 1e-9);
            }
            other => panic!("expected OfferTooFar, got {:?}", other),
        }
    }

    #[test]
    fn test_skips_without_entry_waypoint() {
        let pose = pose_from_xy_yaw(7.5, 0.0, 0.0);
        let mut registry = two_lane_registry(&pose, 5.0, 60);

        // Target lane emptied after its closest waypoint was tracked
        let target = registry.neighbors().right.unwrap();
        registry.get_mut(target).unwrap().lane.waypoints.clear();

        let result = synthesize_lane_change(&registry, &pose, 5.0, &LaneSelectConfig::default());
        assert_eq!(result, Ok(Synthesis::Skipped(SynthesisSkip::NoEntryWaypoint)));
    }

    #[test]
    fn test_skips_without_offer() {
        let pose = pose_from_xy_yaw(11.5, 0.0, 0.0);
        // Closest is already past the offer at 10
        let registry = two_lane_registry(&pose, 5.0, 60);

        let result = synthesize_lane_change(&registry, &pose, 5.0, &LaneSelectConfig::default());
        assert_eq!(result, Ok(Synthesis::Skipped(SynthesisSkip::NoChangeOffer)));
    }

    #[test]
    fn test_requires_current_lane() {
        let registry = LaneRegistry::new();
        let pose = pose_from_xy_yaw(0.0, 0.0, 0.0);
        let result = synthesize_lane_change(&registry, &pose, 0.0, &LaneSelectConfig::default());
        assert_eq!(result, Err(LaneSelectError::NoCurrentLane));
    }

    #[test]
    fn test_exit_offset() {
        assert_eq!(exit_offset(0.0), 3);
        assert_eq!(exit_offset(-4.0), 3);
        assert_eq!(exit_offset(3.4), 3);
        assert_eq!(exit_offset(4.6), 5);
        assert_eq!(exit_offset(12.0), 12);
    }

    proptest! {
        #[test]
        fn prop_built_lane_has_minimum_length(
            velocity in 0.0..12.0f64,
            samples in 0usize..20,
            interval in 0.0..15.0f64,
            start in 0.0..9.0f64,
        ) {
            let pose = pose_from_xy_yaw(start + 0.5, 0.0, 0.0);
            let registry = two_lane_registry(&pose, velocity, 80);
            let config = LaneSelectConfig {
                hermite_curve_sample_count: samples,
                lane_change_interval: interval,
                ..Default::default()
            };

            if let Synthesis::Built(lane) =
                synthesize_lane_change(&registry, &pose, velocity, &config).unwrap()
            {
                prop_assert!(lane.len() >= exit_offset(velocity) + 1 + samples + 1);
            }
        }
    }
}
