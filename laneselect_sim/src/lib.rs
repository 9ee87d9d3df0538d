//! Lane Select Simulation Harness
//!
//! Closed-loop, deterministic runs of the lane selector against a
//! simulated vehicle.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     ScenarioRunner                       │
//! │                                                          │
//! │   RoadBuilder ──LaneArray──▶ ┌────────────────────┐      │
//! │                              │ LaneSelectRuntime  │      │
//! │   VehicleOracle ──Pose─────▶ │  (LaneSelectNode)  │      │
//! │        ▲                     └─────────┬──────────┘      │
//! │        │                               │                 │
//! │        └──── Lane / closest / flag ────┘                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! All randomness (pose noise) is derived from a single 64-bit seed.
//!
//! # Usage
//!
//! ```ignore
//! use laneselect_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::LaneChange);
//! assert!(result.passed);
//! ```

mod error;
mod exporter;
mod oracle;
mod road;
mod runner;
pub mod scenarios;

pub use error::SimError;
pub use exporter::{PoseSample, SimEvent, SimExport, SimFrame};
pub use oracle::VehicleOracle;
pub use road::{ChangeOffer, RoadBuilder};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
