//! Lane selection scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// LS-001: one lane, no offers, steady progress
    SingleLane,

    /// LS-002: right change offered ahead, trajectory prepared
    ChangePrepared,

    /// LS-003: full right lane change and return to MOVE_FORWARD
    LaneChange,

    /// LS-004: localization jumps far off the road and comes back
    PoseJump,

    /// LS-005: target lane lost during a lane change
    LostNeighbor,

    /// LS-006: left lane change on a curved road
    CurvedLeftChange,

    /// LS-007: lane array replaced while driving
    LaneArraySwap,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::SingleLane,
            ScenarioId::ChangePrepared,
            ScenarioId::LaneChange,
            ScenarioId::PoseJump,
            ScenarioId::LostNeighbor,
            ScenarioId::CurvedLeftChange,
            ScenarioId::LaneArraySwap,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::SingleLane => "single_lane",
            ScenarioId::ChangePrepared => "change_prepared",
            ScenarioId::LaneChange => "lane_change",
            ScenarioId::PoseJump => "pose_jump",
            ScenarioId::LostNeighbor => "lost_neighbor",
            ScenarioId::CurvedLeftChange => "curved_left_change",
            ScenarioId::LaneArraySwap => "lane_array_swap",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::SingleLane => "Single straight lane: closest index only moves forward, flag stays straight",
            ScenarioId::ChangePrepared => "Two lanes 3m apart, right offer ahead: change lane ends on the right lane",
            ScenarioId::LaneChange => "Command LANE_CHANGE at the offer, drive the blended lane, return on the right lane",
            ScenarioId::PoseJump => "100m pose jump: -1 published, selection reset, reacquired afterwards",
            ScenarioId::LostNeighbor => "Odometry freeze during a change: target lane lost, flag degrades to unknown",
            ScenarioId::CurvedLeftChange => "Left change on a 200m radius curve",
            ScenarioId::LaneArraySwap => "New lane array mid-drive: stale selection dropped, lane reselected",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single_lane" | "singlelane" | "ls-001" => Ok(ScenarioId::SingleLane),
            "change_prepared" | "changeprepared" | "ls-002" => Ok(ScenarioId::ChangePrepared),
            "lane_change" | "lanechange" | "ls-003" => Ok(ScenarioId::LaneChange),
            "pose_jump" | "posejump" | "ls-004" => Ok(ScenarioId::PoseJump),
            "lost_neighbor" | "lostneighbor" | "ls-005" => Ok(ScenarioId::LostNeighbor),
            "curved_left_change" | "curvedleftchange" | "ls-006" => Ok(ScenarioId::CurvedLeftChange),
            "lane_array_swap" | "lanearrayswap" | "ls-007" => Ok(ScenarioId::LaneArraySwap),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
