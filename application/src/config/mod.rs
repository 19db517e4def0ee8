//! Application-level configuration.
//!
//! - [`AnalysisParams`] - loop control (iterations, tokens, timeouts, parallelism)
//! - [`RetryPolicy`] - backoff for transient remote faults

pub mod execution_params;

pub use execution_params::{AnalysisParams, DEFAULT_MAX_ITERATIONS, RetryPolicy};
