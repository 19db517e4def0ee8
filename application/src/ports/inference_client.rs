//! Inference client port
//!
//! The remote language model, reduced to one call: send the transcript and
//! the tool catalog, get back text, tool calls and a finish reason.

use crate::tools::retry::Transient;
use async_trait::async_trait;
use costpilot_domain::{FinishReason, ToolCallRequest, Transcript};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during an inference request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// Rate limited or out of capacity; safe to retry.
    #[error("Throttled: {0}")]
    Throttled(String),

    #[error("Inference request timed out")]
    Timeout,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl Transient for InferenceError {
    fn is_transient(&self) -> bool {
        matches!(self, InferenceError::Throttled(_))
    }
}

/// One inference request.
#[derive(Debug, Clone, Copy)]
pub struct InferenceRequest<'a> {
    pub transcript: &'a Transcript,
    /// Provider-neutral JSON schemas, one per tool.
    pub tool_schemas: &'a [Value],
    pub max_tokens: u32,
}

/// The model's answer to one request.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResponse {
    pub finish_reason: FinishReason,
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl InferenceResponse {
    /// A final text answer.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            finish_reason: FinishReason::Stop,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// A request to run tools.
    pub fn tool_use(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            finish_reason: FinishReason::ToolCalls,
            content: content.into(),
            tool_calls,
        }
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = reason;
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Port for the remote inference service.
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, request: InferenceRequest<'_>) -> Result<InferenceResponse, InferenceError>;
}
