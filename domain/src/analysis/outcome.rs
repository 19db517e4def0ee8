//! Analysis outcome: the terminal artifact of an orchestration run.

use crate::transcript::entities::Transcript;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an orchestration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// The model signalled completion without further tool calls.
    Success,
    /// The iteration budget ran out before the model finished.
    Partial,
    /// Protocol anomaly or inference transport fault.
    Error,
    /// An external cancellation signal stopped the run.
    Cancelled,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AnalysisStatus::Success => "success",
            AnalysisStatus::Partial => "partial",
            AnalysisStatus::Error => "error",
            AnalysisStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisStatus::Success)
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result handed to the persistence collaborator at the end of a run.
///
/// `text` is the model's final analysis on success, and the latest assistant
/// text otherwise. `message` carries the reason for any non-success status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub status: AnalysisStatus,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub tool_call_count: usize,
    pub iteration_count: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub transcript: Transcript,
}

impl AnalysisOutcome {
    pub fn new(status: AnalysisStatus, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
            message: None,
            tool_call_count: 0,
            iteration_count: 0,
            timestamp: Utc::now(),
            transcript: Transcript::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_counts(mut self, tool_call_count: usize, iteration_count: usize) -> Self {
        self.tool_call_count = tool_call_count;
        self.iteration_count = iteration_count;
        self
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
