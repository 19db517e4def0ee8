//! Port for structured conversation logging.
//!
//! `tracing` carries human-readable diagnostics. This port carries the
//! machine-readable record of a run (assistant turns, tool calls and results,
//! the final outcome), typically written as JSONL.

use serde_json::Value;

/// One structured conversation event.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "assistant_turn", "tool_call", "analysis_complete").
    pub event_type: &'static str,
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Sink for conversation events.
///
/// `log` is synchronous and infallible: a broken log must never stop an
/// analysis, so implementations swallow their own write errors.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
