//! Lane Selector Transport Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction that lets the lane
//! selector run unchanged behind a real message bus, inside a
//! deterministic simulation, or under unit tests.
//!
//! # Core Concept
//!
//! The selection logic never talks to a transport directly:
//! - Inputs arrive through a [`Subscription`] (`recv()`)
//! - Outputs leave through a [`Publisher`] (`publish()`)
//!
//! # Example
//!
//! ```ignore
//! use laneselect_env::{channel, Subscription};
//!
//! let (tx, sub) = channel::<u32>("state");
//! tx.send(7).unwrap();
//! while let Some(msg) = sub.recv().await {
//!     handle(msg);
//! }
//! ```

mod error;
mod publisher;
mod subscription;
mod tokio_impl;
mod types;

pub use error::EnvError;
pub use publisher::{Publisher, RecordingPublisher};
pub use subscription::Subscription;
pub use tokio_impl::{channel, ChannelPublisher, ChannelSubscription};
pub use types::{Header, Topic};
