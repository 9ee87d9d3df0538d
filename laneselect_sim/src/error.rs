//! Errors raised by the simulation harness.

use laneselect_core::LaneSelectError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load lane select configuration: {0}")]
    Config(#[from] LaneSelectError),

    #[error("Invalid road: {0}")]
    InvalidRoad(String),
}
