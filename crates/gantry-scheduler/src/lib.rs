//! Trigger handling and job-matrix orchestration for Gantry.

pub mod bus;
pub mod matrix;
pub mod triggers;

pub use bus::BroadcastSink;
pub use matrix::JobMatrix;
pub use triggers::{TriggerEvent, TriggerMatcher};
