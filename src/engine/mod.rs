//! The connection list engine: orchestration, accumulation and published state

mod accumulator;
mod orchestrator;
mod state;

pub use accumulator::{derive_total_count, Accumulator, MergeMode};
pub use orchestrator::{ConnectionEngine, EngineError};
pub use state::ConnectionState;
