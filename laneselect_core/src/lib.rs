//! Lane Select Core - lane selection and lane-change trajectory synthesis
//!
//! Given several candidate lanes from a route planner, this library decides
//! which lane the vehicle follows and prepares the blended trajectory used
//! when a lane change is commanded:
//! 1. **Progress tracking**: closest waypoint ahead on every lane, with a
//!    speed-scaled search window and a localization-loss gate
//! 2. **Lane roles**: current lane plus its nearest right/left neighbors,
//!    classified by lateral offset
//! 3. **Lane change**: exit run on the current lane, Hermite connector,
//!    entry run on the target lane
//! 4. **Decision**: MOVE_FORWARD / LANE_CHANGE state machine publishing the
//!    followed lane, its closest waypoint and its change flag
//!
//! The [`LaneSelectNode`] is transport-agnostic: it publishes through any
//! [`laneselect_env::Publisher`], and [`LaneSelectRuntime`] drains any
//! [`laneselect_env::Subscription`].

pub mod config;
pub mod decision;
pub mod error;
pub mod geometry;
pub mod hermite;
pub mod lane;
pub mod lane_change;
pub mod lane_registry;
pub mod markers;
pub mod messages;
pub mod neighbor_lanes;
pub mod node;
pub mod runtime;
pub mod waypoint_search;

// Re-export key types for convenience
pub use config::LaneSelectConfig;
pub use decision::{CommandedState, VehicleState};
pub use error::LaneSelectError;
pub use geometry::{LineEquation, Pose};
pub use hermite::HermiteCurve;
pub use lane::{ChangeFlag, Lane, LaneArray, Waypoint};
pub use lane_change::{synthesize_lane_change, LaneForChange, Synthesis, SynthesisSkip};
pub use lane_registry::{LaneCandidate, LaneId, LaneRegistry};
pub use markers::{Marker, MarkerArray};
pub use messages::{InputMessage, OutputMessage, Twist};
pub use neighbor_lanes::NeighborLanes;
pub use node::{LaneSelectNode, TickOutcome};
pub use runtime::{LaneSelectRuntime, RuntimeStats};
