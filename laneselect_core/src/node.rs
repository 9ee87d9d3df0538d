//! Lane Select Node - the MOVE_FORWARD / LANE_CHANGE decision state machine.
//!
//! Every input updates one field of the node and then triggers a tick.
//! A tick runs to completion against the latest snapshot of all inputs and
//! only then hands its outputs to the publisher.
//!
//! # Tick flow
//!
//! ```text
//!   input ──▶ ready? ──no──▶ (skip, nothing published)
//!               │
//!              yes
//!               ▼
//!   recompute closest waypoints on every lane
//!               │
//!     all lost? ├──yes──▶ publish -1, clear selection
//!               ▼
//!   current lane selected? ──no──▶ select current/right/left, publish lane
//!               │
//!              yes
//!               ▼
//!   ┌───────────┴────────────┐
//!   LANE_CHANGE              MOVE_FORWARD
//!   track the change lane    (re)select on the edge back,
//!   publish it on the edge   rebuild the change lane
//!   └───────────┬────────────┘
//!               ▼
//!      publish closest + flag + markers
//! ```

use crate::config::LaneSelectConfig;
use crate::decision::{CommandedState, VehicleState};
use crate::error::LaneSelectError;
use crate::geometry::Pose;
use crate::lane::{ChangeFlag, LaneArray};
use crate::lane_change::{synthesize_lane_change, LaneForChange, Synthesis, SynthesisSkip};
use crate::lane_registry::{LaneId, LaneRegistry};
use crate::markers::build_markers;
use crate::messages::{InputMessage, OutputMessage, Twist};
use crate::waypoint_search::find_closest_ahead;
use laneselect_env::Publisher;
use tracing::{debug, error, info, warn};

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Lanes, pose or velocity not received yet
    Skipped,
    /// No lane (or the current lane) could be associated with the vehicle
    LocalizationLost,
    /// A current lane was (re)selected and published
    Selected(LaneId),
    /// Following the current lane
    MoveForward,
    /// Following the synthesized change lane
    LaneChange,
    /// An internal-consistency error was resolved by a reset
    Faulted,
}

/// The lane selector.
///
/// Generic over the output transport so the same node runs behind a real
/// bus, inside the simulation, or against a recorder in tests.
pub struct LaneSelectNode<P>
where
    P: Publisher<OutputMessage>,
{
    config: LaneSelectConfig,
    registry: LaneRegistry,
    lane_for_change: LaneForChange,
    vehicle: VehicleState,
    lanes_received: bool,

    /// Change flag last published downstream
    published_flag: ChangeFlag,

    publisher: P,
    tick_count: u64,
}

impl<P> LaneSelectNode<P>
where
    P: Publisher<OutputMessage>,
{
    pub fn new(config: LaneSelectConfig, publisher: P) -> Self {
        Self {
            config,
            registry: LaneRegistry::new(),
            lane_for_change: LaneForChange::default(),
            vehicle: VehicleState::default(),
            lanes_received: false,
            published_flag: ChangeFlag::Straight,
            publisher,
            tick_count: 0,
        }
    }

    pub fn config(&self) -> &LaneSelectConfig {
        &self.config
    }

    pub fn registry(&self) -> &LaneRegistry {
        &self.registry
    }

    pub fn lane_for_change(&self) -> &LaneForChange {
        &self.lane_for_change
    }

    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    pub fn published_flag(&self) -> ChangeFlag {
        self.published_flag
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Number of ticks that got past the readiness check.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// True once lanes, pose and velocity have each been received.
    pub fn is_ready(&self) -> bool {
        self.lanes_received && self.vehicle.kinematics().is_some()
    }

    // ------------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------------

    /// Dispatches one input message and runs the resulting tick.
    pub fn handle(&mut self, msg: InputMessage) -> TickOutcome {
        match msg {
            InputMessage::LaneArray(array) => self.on_lane_array(array),
            InputMessage::Pose(pose) => self.on_pose(pose),
            InputMessage::Velocity(twist) => self.on_velocity(twist),
            InputMessage::State(command) => self.on_state(&command),
            InputMessage::Config(config) => self.on_config(config),
        }
    }

    /// Replaces all candidate lanes. Tracked indices, the selection and the
    /// prepared change lane reset.
    pub fn on_lane_array(&mut self, array: LaneArray) -> TickOutcome {
        self.registry.replace_lanes(array);
        self.lane_for_change.clear();
        self.lanes_received = true;
        info!(
            "Received {} lanes (generation {})",
            self.registry.len(),
            self.registry.generation()
        );
        self.tick()
    }

    pub fn on_pose(&mut self, pose: Pose) -> TickOutcome {
        self.vehicle.pose = Some(pose);
        self.tick()
    }

    pub fn on_velocity(&mut self, twist: Twist) -> TickOutcome {
        self.vehicle.velocity = Some(twist.linear.x);
        self.tick()
    }

    pub fn on_state(&mut self, command: &str) -> TickOutcome {
        let commanded = CommandedState::from_command(command);
        if commanded != self.vehicle.commanded {
            info!("Commanded state: {} -> {}", self.vehicle.commanded, commanded);
        }
        self.vehicle.commanded = commanded;
        self.tick()
    }

    pub fn on_config(&mut self, config: LaneSelectConfig) -> TickOutcome {
        info!("Configuration updated: {:?}", config);
        self.config = config;
        self.tick()
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    fn tick(&mut self) -> TickOutcome {
        let Some((pose, velocity)) = self.vehicle.kinematics().filter(|_| self.lanes_received)
        else {
            warn!("Necessary inputs are not received yet. Waiting...");
            return TickOutcome::Skipped;
        };
        self.tick_count += 1;

        let mut outbox = Vec::new();
        let outcome = match self.recompute(&pose, velocity, &mut outbox) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Lane selection tick {} failed: {}", self.tick_count, e);
                outbox.clear();
                self.reset_selection(&mut outbox);
                TickOutcome::Faulted
            }
        };

        outbox.push(OutputMessage::Markers(build_markers(
            &self.registry,
            &self.lane_for_change,
            self.vehicle.commanded,
            self.published_flag,
        )));

        if let Err(e) = self.flush(outbox) {
            error!("Failed to publish tick {}: {}", self.tick_count, e);
        }
        outcome
    }

    fn flush(&self, outbox: Vec<OutputMessage>) -> Result<(), LaneSelectError> {
        for msg in outbox {
            self.publisher.publish(msg)?;
        }
        Ok(())
    }

    fn recompute(
        &mut self,
        pose: &Pose,
        velocity: f64,
        outbox: &mut Vec<OutputMessage>,
    ) -> Result<TickOutcome, LaneSelectError> {
        if !self
            .registry
            .recompute_closest_for_all(pose, velocity, &self.config)?
        {
            self.reset_selection(outbox);
            return Ok(TickOutcome::LocalizationLost);
        }

        let Some(current) = self.registry.current() else {
            return self.select(pose, outbox);
        };

        if self.registry.get(current)?.closest_index.is_none() {
            warn!("Lost the closest waypoint on current lane {}", current);
            self.reset_selection(outbox);
            return Ok(TickOutcome::LocalizationLost);
        }

        self.registry.refresh_change_flags()?;

        let outcome = match self.vehicle.commanded {
            CommandedState::LaneChange => {
                self.follow_lane_change(pose, velocity, outbox)?;
                TickOutcome::LaneChange
            }
            CommandedState::MoveForward => {
                self.move_forward(pose, velocity, outbox)?;
                TickOutcome::MoveForward
            }
        };

        self.vehicle.previous = self.vehicle.commanded;
        Ok(outcome)
    }

    /// Initial selection: picks current/right/left lanes and publishes the
    /// current lane in full.
    fn select(
        &mut self,
        pose: &Pose,
        outbox: &mut Vec<OutputMessage>,
    ) -> Result<TickOutcome, LaneSelectError> {
        let Some(id) = self.registry.select_lanes(pose, self.config.distance_threshold)? else {
            self.reset_selection(outbox);
            return Ok(TickOutcome::LocalizationLost);
        };

        self.registry.refresh_change_flags()?;
        self.apply_straight_override()?;

        let neighbors = self.registry.neighbors();
        info!(
            "Selected current lane {} (right: {:?}, left: {:?})",
            id, neighbors.right, neighbors.left
        );

        let current = self.registry.current_candidate()?;
        outbox.push(OutputMessage::Lane(current.lane.clone()));
        outbox.push(OutputMessage::closest(current.closest_index));
        outbox.push(OutputMessage::ChangeFlag(current.change_flag.code()));
        self.published_flag = current.change_flag;

        // The vehicle now follows a forward lane whatever is commanded
        self.vehicle.previous = CommandedState::MoveForward;
        Ok(TickOutcome::Selected(id))
    }

    fn follow_lane_change(
        &mut self,
        pose: &Pose,
        velocity: f64,
        outbox: &mut Vec<OutputMessage>,
    ) -> Result<(), LaneSelectError> {
        let change = &mut self.lane_for_change;
        change.closest_index = find_closest_ahead(
            &change.lane,
            pose,
            velocity,
            change.closest_index,
            self.config.distance_threshold,
        )?;
        change.change_flag = self
            .registry
            .change_flag_for(&change.lane, change.closest_index)?;
        debug!(
            "LANE_CHANGE closest: {:?}, flag: {}",
            change.closest_index, change.change_flag
        );

        if self.vehicle.previous == CommandedState::MoveForward {
            if change.is_empty() {
                warn!("LANE_CHANGE commanded but no lane change trajectory is prepared");
            } else {
                info!("Starting lane change ({} waypoints)", change.lane.len());
                outbox.push(OutputMessage::Lane(change.lane.clone()));
            }
        }

        outbox.push(OutputMessage::closest(change.closest_index));
        outbox.push(OutputMessage::ChangeFlag(change.change_flag.code()));
        self.published_flag = change.change_flag;
        Ok(())
    }

    fn move_forward(
        &mut self,
        pose: &Pose,
        velocity: f64,
        outbox: &mut Vec<OutputMessage>,
    ) -> Result<(), LaneSelectError> {
        if self.vehicle.previous == CommandedState::LaneChange {
            let id = self
                .registry
                .select_lanes(pose, self.config.distance_threshold)?
                .ok_or(LaneSelectError::NoCurrentLane)?;
            self.registry.refresh_change_flags()?;
            info!("Lane change finished, following lane {}", id);
            outbox.push(OutputMessage::Lane(self.registry.current_candidate()?.lane.clone()));
        }

        match synthesize_lane_change(&self.registry, pose, velocity, &self.config)? {
            Synthesis::Built(lane) => self.lane_for_change.set(lane),
            Synthesis::Skipped(reason) => {
                match reason {
                    SynthesisSkip::OfferTooFar(_) | SynthesisSkip::NoNeighbor(_) => {
                        warn!("No lane change prepared: {}", reason)
                    }
                    _ => debug!("No lane change prepared: {}", reason),
                }
                self.lane_for_change.clear();
            }
        }
        self.apply_straight_override()?;

        let current = self.registry.current_candidate()?;
        outbox.push(OutputMessage::closest(current.closest_index));
        outbox.push(OutputMessage::ChangeFlag(current.change_flag.code()));
        self.published_flag = current.change_flag;
        Ok(())
    }

    /// Without a prepared change lane no change is on offer.
    fn apply_straight_override(&mut self) -> Result<(), LaneSelectError> {
        if self.lane_for_change.is_empty() {
            self.registry.current_candidate_mut()?.change_flag = ChangeFlag::Straight;
        }
        Ok(())
    }

    fn reset_selection(&mut self, outbox: &mut Vec<OutputMessage>) {
        outbox.push(OutputMessage::closest(None));
        self.registry.clear_selection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::pose_from_xy_yaw;
    use crate::lane::{Lane, Waypoint};
    use laneselect_env::{EnvError, Header, RecordingPublisher};

    type TestNode = LaneSelectNode<RecordingPublisher<OutputMessage>>;

    /// Straight lane along +x at height `y`.
    fn lane_at(y: f64, n: usize, spacing: f64) -> Lane {
        let waypoints = (0..n)
            .map(|i| Waypoint::new(pose_from_xy_yaw(i as f64 * spacing, y, 0.0), 5.0))
            .collect();
        Lane::new(Header::default(), waypoints)
    }

    fn node() -> (TestNode, RecordingPublisher<OutputMessage>) {
        let recorder = RecordingPublisher::new();
        let node = LaneSelectNode::new(LaneSelectConfig::default(), recorder.clone());
        (node, recorder)
    }

    /// Messages of a tick without the trailing markers.
    fn core_outputs(recorder: &RecordingPublisher<OutputMessage>) -> Vec<OutputMessage> {
        recorder
            .drain()
            .into_iter()
            .filter(|m| !matches!(m, OutputMessage::Markers(_)))
            .collect()
    }

    fn lanes_published(msgs: &[OutputMessage]) -> Vec<&Lane> {
        msgs.iter()
            .filter_map(|m| match m {
                OutputMessage::Lane(lane) => Some(lane),
                _ => None,
            })
            .collect()
    }

    /// Two parallel lanes 3m apart, lane 0 offering a right change at 10.
    fn two_lanes() -> LaneArray {
        let mut current = lane_at(0.0, 40, 1.0);
        current.waypoints[10].change_flag = ChangeFlag::Right;
        LaneArray::new(vec![current, lane_at(-3.0, 40, 1.0)])
    }

    /// Node on lane 0 of `two_lanes` at waypoint 8, 5 m/s, change prepared.
    fn prepared_node() -> (TestNode, RecordingPublisher<OutputMessage>) {
        let (mut node, recorder) = node();
        node.on_lane_array(two_lanes());
        node.on_velocity(Twist::forward(5.0));
        node.on_pose(pose_from_xy_yaw(8.0, 0.0, 0.0));
        node.on_pose(pose_from_xy_yaw(8.0, 0.0, 0.0));
        recorder.drain();
        (node, recorder)
    }

    #[test]
    fn test_not_ready_publishes_nothing() {
        let (mut node, recorder) = node();

        assert_eq!(node.on_lane_array(two_lanes()), TickOutcome::Skipped);
        assert_eq!(node.on_pose(pose_from_xy_yaw(0.0, 0.0, 0.0)), TickOutcome::Skipped);
        assert_eq!(node.on_state("LANE_CHANGE"), TickOutcome::Skipped);
        assert!(recorder.is_empty());
        assert_eq!(node.tick_count(), 0);
        assert!(!node.is_ready());
    }

    #[test]
    fn test_scenario_a_single_lane_progress() {
        let (mut node, recorder) = node();
        node.on_lane_array(LaneArray::new(vec![lane_at(0.0, 20, 1.0)]));
        node.on_pose(pose_from_xy_yaw(0.0, 0.0, 0.0));

        let outcome = node.on_velocity(Twist::forward(0.0));
        assert!(matches!(outcome, TickOutcome::Selected(_)));

        let msgs = core_outputs(&recorder);
        assert_eq!(lanes_published(&msgs).len(), 1);
        assert!(msgs.contains(&OutputMessage::ClosestWaypoint(1)));
        assert!(msgs.contains(&OutputMessage::ChangeFlag(0)));

        for step in 1..10 {
            let outcome = node.on_pose(pose_from_xy_yaw(step as f64, 0.0, 0.0));
            assert_eq!(outcome, TickOutcome::MoveForward);

            let msgs = core_outputs(&recorder);
            assert_eq!(
                msgs,
                vec![
                    OutputMessage::ClosestWaypoint(step + 1),
                    OutputMessage::ChangeFlag(0),
                ]
            );
            assert!(node.lane_for_change().is_empty());
        }
    }

    #[test]
    fn test_scenario_b_prepares_right_change() {
        let (node, _recorder) = prepared_node();

        let neighbors = node.registry().neighbors();
        assert_eq!(neighbors.right.map(|id| id.index), Some(1));
        assert_eq!(neighbors.left, None);

        let change = node.lane_for_change();
        assert!(!change.is_empty());
        assert_eq!(change.closest_index, None);
        let last = change.lane.waypoints.last().unwrap();
        assert_eq!(last.position().y, -3.0);
        assert_eq!(last.change_flag, ChangeFlag::Straight);

        // Closest waypoint 9 itself carries no offer
        assert_eq!(node.published_flag(), ChangeFlag::Straight);
    }

    #[test]
    fn test_scenario_b_reports_offer_at_change_point() {
        let (mut node, recorder) = prepared_node();

        node.on_pose(pose_from_xy_yaw(9.5, 0.0, 0.0));
        let msgs = core_outputs(&recorder);
        assert_eq!(
            msgs,
            vec![
                OutputMessage::ClosestWaypoint(10),
                OutputMessage::ChangeFlag(ChangeFlag::Right.code()),
            ]
        );
    }

    #[test]
    fn test_scenario_c_lane_change_edges() {
        let (mut node, recorder) = prepared_node();
        let prepared = node.lane_for_change().lane.clone();

        // Edge into LANE_CHANGE publishes the change lane once
        assert_eq!(node.on_state("LANE_CHANGE"), TickOutcome::LaneChange);
        let msgs = core_outputs(&recorder);
        assert_eq!(lanes_published(&msgs), vec![&prepared]);
        assert!(msgs.contains(&OutputMessage::ClosestWaypoint(0)));

        for x in [9.0, 10.0, 11.0] {
            assert_eq!(node.on_pose(pose_from_xy_yaw(x, -0.2, 0.0)), TickOutcome::LaneChange);
            let msgs = core_outputs(&recorder);
            assert!(lanes_published(&msgs).is_empty());
            assert_eq!(msgs.len(), 2);
        }
        assert!(node.lane_for_change().closest_index.is_some());
        assert_eq!(node.lane_for_change().lane, prepared);

        // Edge back republishes the current lane once
        assert_eq!(node.on_state("MOVE_FORWARD"), TickOutcome::MoveForward);
        let msgs = core_outputs(&recorder);
        assert_eq!(lanes_published(&msgs).len(), 1);

        assert_eq!(node.on_pose(pose_from_xy_yaw(12.0, 0.0, 0.0)), TickOutcome::MoveForward);
        assert!(lanes_published(&core_outputs(&recorder)).is_empty());
    }

    #[test]
    fn test_scenario_d_pose_jump_resets() {
        let (mut node, recorder) = prepared_node();
        assert!(node.registry().current().is_some());

        let outcome = node.on_pose(pose_from_xy_yaw(108.0, 100.0, 0.0));
        assert_eq!(outcome, TickOutcome::LocalizationLost);
        assert_eq!(core_outputs(&recorder), vec![OutputMessage::ClosestWaypoint(-1)]);
        assert_eq!(node.registry().current(), None);
        assert!(node
            .registry()
            .candidates()
            .iter()
            .all(|c| c.closest_index.is_none()));

        // Back on the road: full rescan and reselection
        let outcome = node.on_pose(pose_from_xy_yaw(8.0, 0.0, 0.0));
        assert!(matches!(outcome, TickOutcome::Selected(id) if id.index == 0));
        assert!(core_outputs(&recorder).contains(&OutputMessage::ClosestWaypoint(9)));
    }

    #[test]
    fn test_scenario_e_lost_neighbor_degrades_flag() {
        let (mut node, recorder) = node();

        // Dense target lane: a short search window loses it on a 2m jump
        let mut current = lane_at(0.0, 40, 1.0);
        current.waypoints[10].change_flag = ChangeFlag::Right;
        let target = lane_at(-3.0, 160, 0.25);
        node.on_lane_array(LaneArray::new(vec![current, target]));
        node.on_velocity(Twist::forward(5.0));
        node.on_pose(pose_from_xy_yaw(8.0, 0.0, 0.0));
        node.on_pose(pose_from_xy_yaw(8.0, 0.0, 0.0));
        assert!(!node.lane_for_change().is_empty());

        node.on_state("LANE_CHANGE");
        node.on_velocity(Twist::forward(0.0));
        recorder.drain();

        assert_eq!(node.on_pose(pose_from_xy_yaw(10.0, 0.0, 0.0)), TickOutcome::LaneChange);
        assert_eq!(node.registry().candidates()[1].closest_index, None);

        let change = node.lane_for_change();
        let closest = change.closest_index.unwrap();
        assert_eq!(change.lane.waypoints[closest].change_flag, ChangeFlag::Right);
        assert_eq!(change.change_flag, ChangeFlag::Unknown);
        assert!(core_outputs(&recorder).contains(&OutputMessage::ChangeFlag(-1)));
    }

    #[test]
    fn test_lane_array_replacement_reselects() {
        let (mut node, recorder) = prepared_node();
        let old = node.registry().current().unwrap();

        let outcome = node.on_lane_array(two_lanes());
        let TickOutcome::Selected(new) = outcome else {
            panic!("expected reselection, got {:?}", outcome);
        };
        assert_ne!(old, new);
        assert_eq!(lanes_published(&core_outputs(&recorder)).len(), 1);
    }

    #[test]
    fn test_lane_array_replacement_drops_prepared_change() {
        let (mut node, recorder) = prepared_node();
        assert!(!node.lane_for_change().is_empty());

        node.on_lane_array(two_lanes());
        assert!(node.lane_for_change().is_empty());
        recorder.drain();

        // Nothing built from the old geometry reaches the controller
        assert_eq!(node.on_state("LANE_CHANGE"), TickOutcome::LaneChange);
        let msgs = core_outputs(&recorder);
        assert!(lanes_published(&msgs).is_empty());
        assert_eq!(
            msgs,
            vec![
                OutputMessage::ClosestWaypoint(-1),
                OutputMessage::ChangeFlag(ChangeFlag::Unknown.code()),
            ]
        );
    }

    #[test]
    fn test_offer_reported_straight_without_change_lane() {
        let (mut node, recorder) = node();

        // Offer at 10 is live, but the exit run (10 + 5) overruns 14 waypoints
        let mut current = lane_at(0.0, 14, 1.0);
        current.waypoints[10].change_flag = ChangeFlag::Right;
        node.on_lane_array(LaneArray::new(vec![current, lane_at(-3.0, 14, 1.0)]));
        node.on_velocity(Twist::forward(5.0));
        node.on_pose(pose_from_xy_yaw(9.6, 0.0, 0.0));
        recorder.drain();

        assert_eq!(node.on_pose(pose_from_xy_yaw(9.6, 0.0, 0.0)), TickOutcome::MoveForward);
        assert_eq!(
            core_outputs(&recorder),
            vec![OutputMessage::ClosestWaypoint(10), OutputMessage::ChangeFlag(0)]
        );

        assert!(node.lane_for_change().is_empty());
        assert!(node.registry().has_live_neighbor(ChangeFlag::Right));
        let current = node.registry().current_candidate().unwrap();
        assert_eq!(current.lane.waypoints[10].change_flag, ChangeFlag::Right);
        assert_eq!(current.change_flag, ChangeFlag::Straight);
    }

    #[test]
    fn test_config_update_applies() {
        let (mut node, _recorder) = prepared_node();
        let config = LaneSelectConfig {
            hermite_curve_sample_count: 4,
            ..LaneSelectConfig::default()
        };

        assert_eq!(node.on_config(config.clone()), TickOutcome::MoveForward);
        assert_eq!(node.config(), &config);
        // closest 9, exit 15, connector 4, target 20..40
        assert_eq!(node.lane_for_change().lane.len(), 6 + 1 + 4 + 20);
    }

    #[test]
    fn test_every_processed_tick_publishes_markers() {
        let (mut node, recorder) = prepared_node();
        node.on_pose(pose_from_xy_yaw(9.0, 0.0, 0.0));

        let msgs = recorder.drain();
        assert!(matches!(msgs.last(), Some(OutputMessage::Markers(_))));
    }

    struct ClosedPublisher;

    impl Publisher<OutputMessage> for ClosedPublisher {
        fn publish(&self, _msg: OutputMessage) -> Result<(), EnvError> {
            Err(EnvError::closed("closest_waypoint"))
        }
    }

    #[test]
    fn test_publish_failure_does_not_panic() {
        let mut node = LaneSelectNode::new(LaneSelectConfig::default(), ClosedPublisher);
        node.handle(InputMessage::LaneArray(two_lanes()));
        node.handle(InputMessage::Velocity(Twist::forward(5.0)));
        let outcome = node.handle(InputMessage::Pose(pose_from_xy_yaw(8.0, 0.0, 0.0)));

        assert!(matches!(outcome, TickOutcome::Selected(_)));
        assert_eq!(node.tick_count(), 1);
    }
}
