//! Execution parameters for orchestration loop control.
//!
//! [`AnalysisParams`] groups the static parameters that control the
//! [`RunAnalysisUseCase`](crate::use_cases::run_analysis::RunAnalysisUseCase)
//! loop and the tool pipeline beneath it. These are application-layer
//! concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default iteration budget for one analysis.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Loop and tool-pipeline control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Maximum number of inference round-trips.
    pub max_iterations: usize,
    /// Output token cap sent with every inference request.
    pub max_tokens: u32,
    /// Deadline for a single inference request.
    pub inference_timeout: Duration,
    /// Deadline for a single inspection attempt (credential exchange + call).
    pub tool_timeout: Duration,
    /// Run the calls of one assistant turn concurrently.
    pub parallel_tool_calls: bool,
    /// Lifetime requested for assumed-role credentials.
    pub session_duration: Duration,
    pub retry: RetryPolicy,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_tokens: 4096,
            inference_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(60),
            parallel_tool_calls: false,
            session_duration: Duration::from_secs(3600),
            retry: RetryPolicy::default(),
        }
    }
}

impl AnalysisParams {
    // ==================== Builder Methods ====================

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_parallel_tool_calls(mut self, parallel: bool) -> Self {
        self.parallel_tool_calls = parallel;
        self
    }

    pub fn with_session_duration(mut self, duration: Duration) -> Self {
        self.session_duration = duration;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Backoff policy for transient remote faults.
///
/// `max_retries` bounds the total number of attempts, so the default of 3
/// means one call plus two retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Delay before the next attempt, given how many attempts have failed.
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        let factor = 2u32.saturating_pow(failed_attempts);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}
