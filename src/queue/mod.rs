//! Worker pool and run bookkeeping.
//!
//! Components:
//! - `state`: run state machine (idle, running, draining)
//! - `events`: progress/status events broadcast to the presentation layer
//! - `pool`: the live worker pool that drains one batch

pub mod events;
pub mod pool;
pub mod state;

pub use events::QueueEvent;
pub use pool::{RunCounts, WorkerPool};
pub use state::RunState;
