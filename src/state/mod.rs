//! State module for tracking the crawl run lifecycle
//!
//! # Components
//!
//! - `RunState`: Idle, Running, Paused, Completed or Stopped

mod run_state;

pub use run_state::RunState;
