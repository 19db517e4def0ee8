//! Orchestration loop states and the decision rule.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the inference service stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model considers its answer complete.
    Stop,
    /// The model wants tools executed before continuing.
    ToolCalls,
    /// Anything else reported by the service (length cap, content filter, …).
    Other(String),
}

impl FinishReason {
    pub fn is_stop(&self) -> bool {
        matches!(self, FinishReason::Stop)
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::ToolCalls => write!(f, "tool_calls"),
            FinishReason::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// Where a run currently is.
///
/// ```text
/// Requesting ──▶ Deciding ──┬──▶ Executing ──▶ Requesting
///                           ├──▶ Done
///                           └──▶ Stalled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Requesting,
    Deciding,
    Executing,
    Done,
    Stalled,
}

impl LoopState {
    pub fn as_str(&self) -> &str {
        match self {
            LoopState::Requesting => "requesting",
            LoopState::Deciding => "deciding",
            LoopState::Executing => "executing",
            LoopState::Done => "done",
            LoopState::Stalled => "stalled",
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What to do with an assistant turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Finished: stop signal and no tool calls.
    Complete,
    /// Execute the requested tool calls, then ask again.
    ExecuteTools,
    /// Neither finished nor asking for tools.
    Stall,
}

impl Decision {
    /// Tool calls win over the finish reason; a stop without calls completes.
    pub fn decide(finish_reason: &FinishReason, tool_call_count: usize) -> Self {
        if tool_call_count > 0 {
            Decision::ExecuteTools
        } else if finish_reason.is_stop() {
            Decision::Complete
        } else {
            Decision::Stall
        }
    }

    /// State the loop moves to after this decision.
    pub fn next_state(&self) -> LoopState {
        match self {
            Decision::Complete => LoopState::Done,
            Decision::ExecuteTools => LoopState::Executing,
            Decision::Stall => LoopState::Stalled,
        }
    }
}
