//! Analysis loop configuration from TOML (`[analysis]` and `[retry]` sections)

use costpilot_application::{DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_PAGES, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw analysis configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnalysisConfig {
    /// Maximum inference round-trips per analysis
    pub max_iterations: usize,
    /// Deadline for one inference request
    pub inference_timeout_secs: u64,
    /// Deadline for one inspection attempt
    pub tool_timeout_secs: u64,
    /// Run the calls of one assistant turn concurrently
    pub parallel_tool_calls: bool,
    /// Pages followed per listing before the rest is dropped
    pub max_pages: usize,
}

impl Default for FileAnalysisConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            inference_timeout_secs: 120,
            tool_timeout_secs: 60,
            parallel_tool_calls: false,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Raw retry configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    /// Total attempts for a throttled call
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl FileRetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

/// Raw logging configuration from TOML (`[logging]` section)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving structured conversation events
    pub conversation_log: Option<String>,
    /// Diagnostic log file (in addition to stderr)
    pub log_file: Option<String>,
}
