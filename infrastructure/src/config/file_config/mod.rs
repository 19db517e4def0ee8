//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to application types at the
//! edge.

mod analysis;
mod aws;

pub use analysis::{FileAnalysisConfig, FileLoggingConfig, FileRetryConfig};
pub use aws::{DEFAULT_MODEL_ID, FileAwsConfig};

use costpilot_application::{AnalysisParams, PaginationMerger};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;

/// Durations STS accepts for AssumeRole, in seconds.
pub const STS_SESSION_RANGE: RangeInclusive<u64> = 900..=43_200;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("analysis.max_iterations cannot be 0")]
    ZeroIterations,

    #[error("analysis.max_pages cannot be 0")]
    ZeroPages,

    #[error("{0} cannot be 0")]
    ZeroTimeout(&'static str),

    #[error("aws.session_duration_secs must be between 900 and 43200, got {0}")]
    InvalidSessionDuration(u64),

    #[error("aws.{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("retry.max_retries cannot be 0")]
    ZeroRetries,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Credentials, regions and model
    pub aws: FileAwsConfig,
    /// Loop limits and timeouts
    pub analysis: FileAnalysisConfig,
    /// Backoff for throttled calls
    pub retry: FileRetryConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.analysis.max_iterations == 0 {
            return Err(ConfigValidationError::ZeroIterations);
        }
        if self.analysis.max_pages == 0 {
            return Err(ConfigValidationError::ZeroPages);
        }
        if self.analysis.inference_timeout_secs == 0 {
            return Err(ConfigValidationError::ZeroTimeout(
                "analysis.inference_timeout_secs",
            ));
        }
        if self.analysis.tool_timeout_secs == 0 {
            return Err(ConfigValidationError::ZeroTimeout(
                "analysis.tool_timeout_secs",
            ));
        }
        if !STS_SESSION_RANGE.contains(&self.aws.session_duration_secs) {
            return Err(ConfigValidationError::InvalidSessionDuration(
                self.aws.session_duration_secs,
            ));
        }
        if self.aws.region.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("region"));
        }
        if self.aws.model_id.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("model_id"));
        }
        if self.retry.max_retries == 0 {
            return Err(ConfigValidationError::ZeroRetries);
        }
        Ok(())
    }

    /// Loop parameters for the analysis use case
    pub fn analysis_params(&self) -> AnalysisParams {
        AnalysisParams::default()
            .with_max_iterations(self.analysis.max_iterations)
            .with_max_tokens(self.aws.max_tokens)
            .with_inference_timeout(Duration::from_secs(self.analysis.inference_timeout_secs))
            .with_tool_timeout(Duration::from_secs(self.analysis.tool_timeout_secs))
            .with_parallel_tool_calls(self.analysis.parallel_tool_calls)
            .with_session_duration(Duration::from_secs(self.aws.session_duration_secs))
            .with_retry(self.retry.to_policy())
    }

    /// Page bound for every inventory listing
    pub fn pagination_merger(&self) -> PaginationMerger {
        PaginationMerger::new(self.analysis.max_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[aws]
profile = "billing"
region = "eu-west-1"
inference_region = "us-east-1"
model_id = "anthropic.claude-3-5-sonnet-20240620-v1:0"
session_duration_secs = 1800

[analysis]
max_iterations = 5
parallel_tool_calls = true

[retry]
max_retries = 4
base_delay_ms = 500

[logging]
conversation_log = "/tmp/costpilot.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.aws.profile.as_deref(), Some("billing"));
        assert_eq!(config.aws.region, "eu-west-1");
        assert_eq!(config.aws.inference_region.as_deref(), Some("us-east-1"));
        assert_eq!(config.analysis.max_iterations, 5);
        assert!(config.analysis.parallel_tool_calls);
        assert_eq!(config.retry.max_retries, 4);
        assert_eq!(config.retry.max_delay_ms, 30_000);
        assert_eq!(
            config.logging.conversation_log.as_deref(),
            Some("/tmp/costpilot.jsonl")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[analysis]\nmax_iterations = 3\n").unwrap();
        assert_eq!(config.analysis.max_iterations, 3);
        // Defaults should apply
        assert_eq!(config.aws.region, "us-east-1");
        assert_eq!(config.aws.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.analysis.tool_timeout_secs, 60);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(FileConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_iterations() {
        let mut config = FileConfig::default();
        config.analysis.max_iterations = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::ZeroIterations));
    }

    #[test]
    fn test_max_pages_defaults_and_validates() {
        let config: FileConfig = toml::from_str("[analysis]\nmax_pages = 5\n").unwrap();
        assert_eq!(config.analysis.max_pages, 5);
        assert_eq!(FileConfig::default().analysis.max_pages, 1000);

        let mut config = FileConfig::default();
        config.analysis.max_pages = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::ZeroPages));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = FileConfig::default();
        config.analysis.tool_timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::ZeroTimeout("analysis.tool_timeout_secs"))
        ));
    }

    #[test]
    fn test_validate_session_duration_range() {
        let mut config = FileConfig::default();
        config.aws.session_duration_secs = 600;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidSessionDuration(600))
        );
        config.aws.session_duration_secs = 43_200;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_analysis_params_conversion() {
        let mut config = FileConfig::default();
        config.analysis.max_iterations = 7;
        config.analysis.inference_timeout_secs = 30;
        config.aws.max_tokens = 2048;

        let params = config.analysis_params();
        assert_eq!(params.max_iterations, 7);
        assert_eq!(params.max_tokens, 2048);
        assert_eq!(params.inference_timeout, Duration::from_secs(30));
        assert_eq!(params.session_duration, Duration::from_secs(3600));
        assert_eq!(params.retry.max_retries, 3);
    }
}
