//! Input and internal bookkeeping for the analysis use case.

use crate::config::AnalysisParams;
use crate::ports::inference_client::InferenceError;
use costpilot_domain::{AnalysisOutcome, AnalysisStatus, ClientProfile, Transcript};

/// Input for one analysis run.
///
/// Parameters left unset come from the use case
/// ([`RunAnalysisUseCase::with_params`](super::RunAnalysisUseCase::with_params)).
#[derive(Debug, Clone)]
pub struct RunAnalysisInput {
    /// The account to inspect.
    pub profile: ClientProfile,
    /// What the caller wants analyzed.
    pub prompt: String,
    /// Loop limits and timeouts for this run only.
    pub params: Option<AnalysisParams>,
    /// Iteration budget for this run only; wins over `params`.
    pub max_iterations: Option<usize>,
}

impl RunAnalysisInput {
    pub fn new(profile: ClientProfile, prompt: impl Into<String>) -> Self {
        Self {
            profile,
            prompt: prompt.into(),
            params: None,
            max_iterations: None,
        }
    }

    pub fn with_params(mut self, params: AnalysisParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// The parameters this run uses, given the use case's defaults.
    pub(super) fn effective_params(&self, defaults: &AnalysisParams) -> AnalysisParams {
        let mut params = self.params.clone().unwrap_or_else(|| defaults.clone());
        if let Some(max_iterations) = self.max_iterations {
            params.max_iterations = max_iterations;
        }
        params
    }
}

/// Why an inference round did not produce a response.
#[derive(Debug)]
pub(super) enum RequestFailure {
    Cancelled,
    Inference(InferenceError),
    /// Retries ran out on a throttled request.
    Exhausted { error: InferenceError, attempts: u32 },
}

impl RequestFailure {
    pub(super) fn message(&self) -> String {
        match self {
            RequestFailure::Cancelled => super::CANCELLED_MESSAGE.to_string(),
            RequestFailure::Inference(error) => format!("Inference request failed: {}", error),
            RequestFailure::Exhausted { error, attempts } => format!(
                "Inference request failed after {} attempts: {}",
                attempts, error
            ),
        }
    }
}

/// Mutable state of a single run.
#[derive(Debug)]
pub(super) struct RunState {
    pub transcript: Transcript,
    pub iteration: usize,
    pub tool_call_count: usize,
}

impl RunState {
    pub(super) fn new(transcript: Transcript) -> Self {
        Self {
            transcript,
            iteration: 0,
            tool_call_count: 0,
        }
    }

    /// Close the run. `text` falls back to the latest assistant text.
    pub(super) fn finish(
        self,
        status: AnalysisStatus,
        text: Option<String>,
        message: Option<String>,
    ) -> AnalysisOutcome {
        let text = text
            .or_else(|| self.transcript.last_assistant_text().map(str::to_string))
            .unwrap_or_default();
        let outcome = AnalysisOutcome::new(status, text)
            .with_counts(self.tool_call_count, self.iteration)
            .with_transcript(self.transcript);
        match message {
            Some(message) => outcome.with_message(message),
            None => outcome,
        }
    }
}
