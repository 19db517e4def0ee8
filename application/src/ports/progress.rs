//! Analysis progress port.
//!
//! [`AnalysisProgressNotifier`] is an **output port** the presentation layer
//! implements to show a run as it happens. Every method has a no-op default,
//! so implementers only override the callbacks they care about.
//!
//! ```ignore
//! struct Printer;
//!
//! impl AnalysisProgressNotifier for Printer {
//!     fn on_tool_call(&self, tool_name: &str, _args: &str) {
//!         println!("-> {}", tool_name);
//!     }
//! }
//! ```

use costpilot_domain::{AnalysisOutcome, FinishReason};

pub trait AnalysisProgressNotifier: Send + Sync {
    /// Called before each inference request.
    fn on_iteration_start(&self, _iteration: usize, _max_iterations: usize) {}

    /// Called when the inference service answers.
    fn on_inference_complete(&self, _finish_reason: &FinishReason, _tool_calls: usize) {}

    /// Called with any assistant text that accompanies the response.
    fn on_assistant_text(&self, _text: &str) {}

    /// Called when a tool is about to run.
    fn on_tool_call(&self, _tool_name: &str, _args: &str) {}

    /// Called when a tool returns.
    fn on_tool_result(&self, _tool_name: &str, _success: bool, _cached: bool) {}

    /// Called when an alias was resolved to a catalog tool.
    fn on_tool_resolved(&self, _original_name: &str, _resolved_name: &str) {}

    /// Called before a retry of a throttled remote call.
    fn on_retry(&self, _operation: &str, _attempt: u32, _max_attempts: u32, _error: &str) {}

    /// Called once with the final outcome.
    fn on_complete(&self, _outcome: &AnalysisOutcome) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoAnalysisProgress;

impl AnalysisProgressNotifier for NoAnalysisProgress {}
