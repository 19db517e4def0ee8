//! Orchestration domain
//!
//! The pure parts of the analysis loop: its states and the rule that turns
//! an assistant turn into the next step. Driving the loop (I/O, timeouts,
//! cancellation) is the application layer's job.

pub mod state;

pub use state::{Decision, FinishReason, LoopState};
