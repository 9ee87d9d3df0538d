//! Scenario runner - drives the lane selector in closed loop.
//!
//! Each scenario builds a road, places a [`VehicleOracle`] on it and feeds
//! the selector through a [`LaneSelectRuntime`]. Every lane the selector
//! publishes is handed back to the oracle, which then drives along it.

use crate::exporter::{PoseSample, SimExport, SimFrame};
use crate::oracle::VehicleOracle;
use crate::road::RoadBuilder;
use crate::scenarios::ScenarioId;

use laneselect_core::geometry::{self, Pose};
use laneselect_core::{
    ChangeFlag, CommandedState, InputMessage, Lane, LaneArray, LaneSelectConfig, LaneSelectNode,
    LaneSelectRuntime, OutputMessage, RuntimeStats, TickOutcome, Twist,
};
use laneselect_env::RecordingPublisher;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total pose ticks driven
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioMetrics {
    /// Tick outcomes of the selector
    pub stats: RuntimeStats,

    /// Full lanes published
    pub lanes_published: u64,

    /// LANE_CHANGE commands issued
    pub lane_changes: u64,

    /// Largest distance between the vehicle and the lane it followed (m)
    pub max_cross_track_error: f64,

    /// Index of the current lane at the end of the run
    pub final_lane: Option<usize>,
}

/// Runs lane selection scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Pose rate in Hz
    tick_rate_hz: u32,

    /// Maximum duration in seconds
    max_duration_secs: f64,

    /// Pose measurement noise (m, 1 sigma)
    pose_noise_std: f64,

    /// Selector configuration
    config: LaneSelectConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            tick_rate_hz: 10,
            max_duration_secs: 20.0,
            pose_noise_std: 0.05,
            config: LaneSelectConfig::default(),
        }
    }

    /// Sets the pose rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz.max(1);
        self
    }

    /// Sets the maximum duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.max_duration_secs = secs;
        self
    }

    pub fn with_pose_noise(mut self, std_dev: f64) -> Self {
        self.pose_noise_std = std_dev;
        self
    }

    pub fn with_config(mut self, config: LaneSelectConfig) -> Self {
        self.config = config;
        self
    }

    fn dt(&self) -> f64 {
        1.0 / self.tick_rate_hz as f64
    }

    fn max_ticks(&self) -> u64 {
        (self.max_duration_secs * self.tick_rate_hz as f64) as u64
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, None).0
    }

    /// Runs a scenario and records every processed message.
    pub fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        let export = SimExport::new(scenario.name(), self.seed);
        let (result, export) = self.execute(scenario, Some(export));
        let mut export = export.unwrap_or_else(|| SimExport::new(scenario.name(), self.seed));
        export.finalize(result.passed, result.failure_reason.clone());
        (result, export)
    }

    fn execute(
        &self,
        scenario: ScenarioId,
        export: Option<SimExport>,
    ) -> (ScenarioResult, Option<SimExport>) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("{}", scenario.description());

        let outcome = match scenario {
            ScenarioId::SingleLane => self.run_single_lane(export),
            ScenarioId::ChangePrepared => self.run_change_prepared(export),
            ScenarioId::LaneChange => self.run_lane_change(export),
            ScenarioId::PoseJump => self.run_pose_jump(export),
            ScenarioId::LostNeighbor => self.run_lost_neighbor(export),
            ScenarioId::CurvedLeftChange => self.run_curved_left_change(export),
            ScenarioId::LaneArraySwap => self.run_lane_array_swap(export),
        };

        match outcome {
            Ok((harness, verdict)) => {
                let result = ScenarioResult {
                    scenario,
                    seed: self.seed,
                    passed: verdict.is_ok(),
                    total_ticks: harness.ticks,
                    final_time_secs: harness.oracle.time(),
                    failure_reason: verdict.err(),
                    metrics: harness.metrics(),
                };
                (result, harness.export)
            }
            Err(reason) => (
                ScenarioResult {
                    scenario,
                    seed: self.seed,
                    passed: false,
                    total_ticks: 0,
                    final_time_secs: 0.0,
                    failure_reason: Some(reason),
                    metrics: ScenarioMetrics::default(),
                },
                None,
            ),
        }
    }

    fn harness(
        &self,
        lanes: &LaneArray,
        start_lane: usize,
        start_index: usize,
        speed: f64,
        export: Option<SimExport>,
    ) -> Result<Harness, String> {
        let lane = lanes
            .lanes
            .get(start_lane)
            .ok_or_else(|| format!("road has no lane {}", start_lane))?;

        let physics_seed = self.seed.wrapping_mul(0x9e3779b97f4a7c15);
        let oracle = VehicleOracle::new(physics_seed, self.pose_noise_std, lane, start_index, speed);

        let outputs = RecordingPublisher::new();
        let node = LaneSelectNode::new(self.config.clone(), outputs.clone());

        Ok(Harness {
            runtime: LaneSelectRuntime::new(node),
            outputs,
            oracle,
            dt: self.dt(),
            max_ticks: self.max_ticks(),
            ticks: 0,
            closest: -1,
            flag: ChangeFlag::Straight,
            followed: None,
            lanes_published: 0,
            lane_changes: 0,
            max_cross_track_error: 0.0,
            last_measured: None,
            export,
        })
    }

    /// LS-001: single lane, no offers.
    ///
    /// **Assertion**: closest index never decreases and is never -1, the
    /// flag stays straight and no change lane is ever prepared.
    fn run_single_lane(&self, export: Option<SimExport>) -> ScenarioRun {
        let lanes = RoadBuilder::new(400, 1.0).build().map_err(|e| e.to_string())?;
        let mut h = self.harness(&lanes, 0, 0, 2.0, export)?;

        let verdict = (|| -> Result<(), String> {
            h.start(lanes)?;
            let mut last = h.closest;
            while h.can_drive() {
                h.drive()?;
                if h.closest < last {
                    return Err(format!("closest went back from {} to {}", last, h.closest));
                }
                if h.flag != ChangeFlag::Straight {
                    return Err(format!("flag {} on a lane without offers", h.flag));
                }
                if !h.node().lane_for_change().is_empty() {
                    return Err("change lane prepared without offer".to_string());
                }
                last = h.closest;
            }
            Ok(())
        })();

        Ok((h, verdict))
    }

    /// LS-002: right offer ahead at 5 m/s.
    ///
    /// **Assertion**: the right lane is the right neighbor and the prepared
    /// change lane ends on it.
    fn run_change_prepared(&self, export: Option<SimExport>) -> ScenarioRun {
        let lanes = RoadBuilder::new(40, 1.0)
            .with_lanes(&[0.0, -3.0])
            .with_offer(0, 10..11, ChangeFlag::Right)
            .build()
            .map_err(|e| e.to_string())?;
        let target_end = lanes.lanes[1]
            .waypoints
            .last()
            .map(|w| w.position())
            .ok_or("empty target lane")?;
        let mut h = self.harness(&lanes, 0, 8, 5.0, export)?;

        let verdict = (|| -> Result<(), String> {
            h.start(lanes)?;
            h.drive()?;
            h.drive()?;

            let node = h.node();
            let right = node.registry().neighbors().right.map(|id| id.index);
            if right != Some(1) {
                return Err(format!("right neighbor is {:?}, expected lane 1", right));
            }
            let end = node
                .lane_for_change()
                .lane
                .waypoints
                .last()
                .map(|w| w.position())
                .ok_or("no change lane prepared")?;
            let gap = geometry::planar_distance(&end, &target_end);
            if gap > 0.01 {
                return Err(format!("change lane ends {:.2}m from the right lane end", gap));
            }
            Ok(())
        })();

        Ok((h, verdict))
    }

    /// LS-003: full right lane change on a straight road.
    ///
    /// **Assertion**: the change lane is published once on entering
    /// LANE_CHANGE, the right lane once on leaving it, and the vehicle ends
    /// on the right lane.
    fn run_lane_change(&self, export: Option<SimExport>) -> ScenarioRun {
        let lanes = RoadBuilder::new(200, 1.0)
            .with_lanes(&[0.0, -3.0])
            .with_offer(0, 40..80, ChangeFlag::Right)
            .build()
            .map_err(|e| e.to_string())?;
        self.closed_loop_change(lanes, ChangeFlag::Right, export)
    }

    /// LS-006: left lane change on a 200m radius curve.
    fn run_curved_left_change(&self, export: Option<SimExport>) -> ScenarioRun {
        let lanes = RoadBuilder::new(300, 1.0)
            .with_curvature(1.0 / 200.0)
            .with_lanes(&[0.0, 2.8])
            .with_offer(0, 40..80, ChangeFlag::Left)
            .build()
            .map_err(|e| e.to_string())?;
        self.closed_loop_change(lanes, ChangeFlag::Left, export)
    }

    fn closed_loop_change(
        &self,
        lanes: LaneArray,
        flag: ChangeFlag,
        export: Option<SimExport>,
    ) -> ScenarioRun {
        let target = lanes.lanes.get(1).cloned().ok_or("road needs two lanes")?;
        let mut h = self.harness(&lanes, 0, 0, 5.0, export)?;

        let verdict = (|| -> Result<(), String> {
            h.start(lanes)?;
            let trace = h.change_lanes(flag)?;

            if trace.published_on_entry != 1 {
                return Err(format!(
                    "{} lanes published entering LANE_CHANGE, expected 1",
                    trace.published_on_entry
                ));
            }
            if trace.published_on_exit != 1 {
                return Err(format!(
                    "{} lanes published leaving LANE_CHANGE, expected 1",
                    trace.published_on_exit
                ));
            }

            for _ in 0..20 {
                if !h.can_drive() {
                    break;
                }
                h.drive()?;
            }

            let lane = h.current_lane();
            if lane != Some(1) {
                return Err(format!("ended on lane {:?}, expected 1", lane));
            }
            let error = h.oracle.cross_track_error(&target).ok_or("no cross-track error")?;
            if error > 0.5 {
                return Err(format!("{:.2}m off the target lane", error));
            }
            Ok(())
        })();

        Ok((h, verdict))
    }

    /// LS-004: localization jumps 100m away for one pose.
    ///
    /// **Assertion**: the jump publishes -1 and clears the selection; the
    /// next good pose reselects the lane.
    fn run_pose_jump(&self, export: Option<SimExport>) -> ScenarioRun {
        let lanes = RoadBuilder::new(200, 1.0).build().map_err(|e| e.to_string())?;
        let mut h = self.harness(&lanes, 0, 0, 5.0, export)?;

        let verdict = (|| -> Result<(), String> {
            h.start(lanes)?;
            for _ in 0..20 {
                h.drive()?;
            }

            let p = h.oracle.true_position();
            let jumped = geometry::pose_from_xy_yaw(p.x, p.y + 100.0, 0.0);
            let outcome = h.send(InputMessage::Pose(jumped));
            h.event("pose jump of 100m");
            if outcome != TickOutcome::LocalizationLost || h.closest != -1 {
                return Err(format!("jump gave {:?} / closest {}", outcome, h.closest));
            }
            if h.current_lane().is_some() {
                return Err("selection survived the jump".to_string());
            }

            h.oracle.step(h.dt);
            h.ticks += 1;
            let pose = h.oracle.measured_pose();
            let outcome = h.send(InputMessage::Pose(pose));
            if !matches!(outcome, TickOutcome::Selected(_)) {
                return Err(format!("expected reselection after the jump, got {:?}", outcome));
            }

            for _ in 0..10 {
                h.drive()?;
            }
            Ok(())
        })();

        Ok((h, verdict))
    }

    /// LS-005: odometry freezes at 0 m/s right after LANE_CHANGE is commanded
    /// while poses arrive at a fifth of the rate. The short search window
    /// loses the densely sampled target lane.
    ///
    /// **Assertion**: a Right flag is never published while the right lane is
    /// not tracked, and at least one tick degrades to Unknown.
    fn run_lost_neighbor(&self, export: Option<SimExport>) -> ScenarioRun {
        let current = RoadBuilder::new(200, 1.0)
            .with_offer(0, 40..80, ChangeFlag::Right)
            .build()
            .map_err(|e| e.to_string())?;
        let target = RoadBuilder::new(800, 0.25)
            .with_lanes(&[-3.0])
            .build()
            .map_err(|e| e.to_string())?;
        let lanes = LaneArray::new(current.lanes.into_iter().chain(target.lanes).collect());
        let mut h = self.harness(&lanes, 0, 0, 5.0, export)?;

        let verdict = (|| -> Result<(), String> {
            h.start(lanes)?;
            h.drive_until_offer(ChangeFlag::Right)?;
            h.command(CommandedState::LaneChange);

            h.send(InputMessage::Velocity(Twist::forward(0.0)));
            h.event("odometry frozen at 0 m/s");

            let mut degraded = 0;
            for _ in 0..20 {
                h.oracle.step(h.dt * 5.0);
                h.ticks += 1;
                let pose = h.oracle.measured_pose();
                let outcome = h.send(InputMessage::Pose(pose));
                if outcome != TickOutcome::LaneChange {
                    return Err(format!("left LANE_CHANGE unexpectedly: {:?}", outcome));
                }

                let node = h.node();
                let tracked = node
                    .registry()
                    .neighbors()
                    .right
                    .and_then(|id| node.registry().get(id).ok())
                    .is_some_and(|c| c.closest_index.is_some());
                if h.flag == ChangeFlag::Right && !tracked {
                    return Err("stale Right flag with the right lane lost".to_string());
                }
                if h.flag == ChangeFlag::Unknown && !tracked {
                    degraded += 1;
                }
            }

            if degraded == 0 {
                return Err("right lane was never lost".to_string());
            }
            debug!("{} ticks degraded to unknown", degraded);
            Ok(())
        })();

        Ok((h, verdict))
    }

    /// LS-007: a new lane array with an extra lane arrives mid-drive.
    ///
    /// **Assertion**: the swap reselects immediately on the new generation
    /// and driving continues without loss.
    fn run_lane_array_swap(&self, export: Option<SimExport>) -> ScenarioRun {
        let lanes = RoadBuilder::new(200, 1.0)
            .with_lanes(&[0.0, -3.0])
            .build()
            .map_err(|e| e.to_string())?;
        let replanned = RoadBuilder::new(200, 1.0)
            .with_lanes(&[3.0, 0.0, -3.0])
            .with_stamp(std::time::Duration::from_secs(1))
            .build()
            .map_err(|e| e.to_string())?;
        let mut h = self.harness(&lanes, 0, 0, 5.0, export)?;

        let verdict = (|| -> Result<(), String> {
            h.start(lanes)?;
            for _ in 0..20 {
                h.drive()?;
            }

            let published = h.lanes_published;
            let outcome = h.send(InputMessage::LaneArray(replanned));
            h.event("lane array replaced");
            match outcome {
                TickOutcome::Selected(id) if id.generation == 2 && id.index == 1 => {}
                other => return Err(format!("swap gave {:?}, expected lane 2#1", other)),
            }
            if h.lanes_published != published + 1 {
                return Err("reselected lane not published".to_string());
            }

            for _ in 0..10 {
                h.drive()?;
            }
            Ok(())
        })();

        Ok((h, verdict))
    }
}

/// Harness after the run, plus the verdict.
type ScenarioRun = Result<(Harness, Result<(), String>), String>;

/// Lane publishes observed around a lane change.
#[derive(Debug, Clone, Copy, Default)]
struct ChangeTrace {
    published_on_entry: u64,
    published_on_exit: u64,
}

/// Closed-loop wiring of one selector and one vehicle.
struct Harness {
    runtime: LaneSelectRuntime<RecordingPublisher<OutputMessage>>,
    outputs: RecordingPublisher<OutputMessage>,
    oracle: VehicleOracle,
    dt: f64,
    max_ticks: u64,
    ticks: u64,

    /// Last published closest waypoint
    closest: i32,

    /// Last published change flag
    flag: ChangeFlag,

    /// Last published lane
    followed: Option<Lane>,

    lanes_published: u64,
    lane_changes: u64,
    max_cross_track_error: f64,
    last_measured: Option<Pose>,
    export: Option<SimExport>,
}

impl Harness {
    fn node(&self) -> &LaneSelectNode<RecordingPublisher<OutputMessage>> {
        self.runtime.node()
    }

    fn current_lane(&self) -> Option<usize> {
        self.node().registry().current().map(|id| id.index)
    }

    /// Keeps a margin to the end of the road, where nothing lies ahead.
    fn can_drive(&self) -> bool {
        self.ticks < self.max_ticks && self.oracle.remaining_distance() > 5.0
    }

    fn metrics(&self) -> ScenarioMetrics {
        ScenarioMetrics {
            stats: self.runtime.stats().clone(),
            lanes_published: self.lanes_published,
            lane_changes: self.lane_changes,
            max_cross_track_error: self.max_cross_track_error,
            final_lane: self.current_lane(),
        }
    }

    fn event(&mut self, message: &str) {
        info!("  t={:.1}s: {}", self.oracle.time(), message);
        let time = self.oracle.time();
        if let Some(export) = &mut self.export {
            export.add_event(time, message);
        }
    }

    /// Hands one message to the selector and applies what it published.
    fn send(&mut self, msg: InputMessage) -> TickOutcome {
        if let InputMessage::Pose(pose) = &msg {
            self.last_measured = Some(*pose);
        }
        let outcome = self.runtime.step(msg);

        for out in self.outputs.drain() {
            match out {
                OutputMessage::Lane(lane) => {
                    self.oracle.follow(&lane);
                    self.followed = Some(lane);
                    self.lanes_published += 1;
                }
                OutputMessage::ClosestWaypoint(index) => self.closest = index,
                OutputMessage::ChangeFlag(code) => self.flag = ChangeFlag::from_code(code),
                OutputMessage::Markers(_) => {}
            }
        }

        if let Some(error) = self
            .followed
            .as_ref()
            .and_then(|lane| self.oracle.cross_track_error(lane))
        {
            self.max_cross_track_error = self.max_cross_track_error.max(error);
        }

        self.record(outcome);
        outcome
    }

    fn record(&mut self, outcome: TickOutcome) {
        let Some(measured) = self.last_measured else {
            return;
        };
        let frame = SimFrame {
            time_sec: self.oracle.time(),
            true_pose: PoseSample::new(&self.oracle.true_pose()),
            measured_pose: PoseSample::new(&measured),
            state: self.node().vehicle().commanded.to_string(),
            outcome: format!("{:?}", outcome),
            closest_waypoint: self.closest,
            change_flag: self.flag.code(),
            current_lane: self.current_lane(),
            change_lane_len: self.node().lane_for_change().lane.len(),
            cross_track_error: self
                .followed
                .as_ref()
                .and_then(|lane| self.oracle.cross_track_error(lane)),
        };
        if let Some(export) = &mut self.export {
            export.add_frame(frame);
        }
    }

    /// Sends the lane array, velocity and first pose; the last one selects.
    fn start(&mut self, lanes: LaneArray) -> Result<(), String> {
        self.send(InputMessage::LaneArray(lanes));
        self.send(InputMessage::Velocity(Twist::forward(self.oracle.speed())));
        let pose = self.oracle.measured_pose();
        match self.send(InputMessage::Pose(pose)) {
            TickOutcome::Selected(id) => {
                info!("  initial lane {}", id);
                Ok(())
            }
            other => Err(format!("initial selection failed: {:?}", other)),
        }
    }

    /// Advances the vehicle one tick and reports its pose.
    fn drive(&mut self) -> Result<TickOutcome, String> {
        self.oracle.step(self.dt);
        self.ticks += 1;
        let pose = self.oracle.measured_pose();
        match self.send(InputMessage::Pose(pose)) {
            outcome @ (TickOutcome::LocalizationLost | TickOutcome::Faulted) => Err(format!(
                "{:?} at t={:.1}s (closest {})",
                outcome,
                self.oracle.time(),
                self.closest
            )),
            outcome => Ok(outcome),
        }
    }

    fn command(&mut self, state: CommandedState) -> TickOutcome {
        if state == CommandedState::LaneChange {
            self.lane_changes += 1;
        }
        self.event(&format!("{} commanded", state));
        self.send(InputMessage::State(state.as_str().to_string()))
    }

    /// Drives forward until the current lane offers `flag` with a change
    /// lane prepared.
    fn drive_until_offer(&mut self, flag: ChangeFlag) -> Result<(), String> {
        while self.can_drive() {
            self.drive()?;
            if self.flag == flag && !self.node().lane_for_change().is_empty() {
                return Ok(());
            }
        }
        Err(format!("no {} offer reached", flag))
    }

    /// Performs a lane change the way a behavior planner would: command it
    /// at the offer, drive the published change lane, and command
    /// MOVE_FORWARD once its flagged stretch has been passed.
    fn change_lanes(&mut self, flag: ChangeFlag) -> Result<ChangeTrace, String> {
        self.drive_until_offer(flag)?;

        let before = self.lanes_published;
        if self.command(CommandedState::LaneChange) != TickOutcome::LaneChange {
            return Err("LANE_CHANGE not taken".to_string());
        }
        let published_on_entry = self.lanes_published - before;

        let mut seen_offer = self.flag.is_change_offer();
        while self.can_drive() {
            self.drive()?;
            if self.flag.is_change_offer() {
                seen_offer = true;
            } else if seen_offer && self.flag == ChangeFlag::Straight {
                let before = self.lanes_published;
                if self.command(CommandedState::MoveForward) != TickOutcome::MoveForward {
                    return Err("MOVE_FORWARD not taken".to_string());
                }
                return Ok(ChangeTrace {
                    published_on_entry,
                    published_on_exit: self.lanes_published - before,
                });
            }
        }

        warn!("Lane change still running after {} ticks", self.ticks);
        Err("lane change did not complete".to_string())
    }
}
