//! AWS configuration from TOML (`[aws]` section)

use serde::{Deserialize, Serialize};

/// Default Bedrock model (cross-region inference profile).
pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-sonnet-4-20250514-v1:0";

/// Raw AWS configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAwsConfig {
    /// Named profile for the base credentials (default chain when unset)
    pub profile: Option<String>,
    /// Default region for inspected resources
    pub region: String,
    /// Region hosting Bedrock, when different from `region`
    pub inference_region: Option<String>,
    /// Bedrock model or inference profile id
    pub model_id: String,
    /// Output token cap per inference request
    pub max_tokens: u32,
    /// Lifetime of assumed-role credentials, in seconds
    pub session_duration_secs: u64,
    /// `RoleSessionName` sent with AssumeRole
    pub role_session_name: String,
}

impl Default for FileAwsConfig {
    fn default() -> Self {
        Self {
            profile: None,
            region: "us-east-1".to_string(),
            inference_region: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            max_tokens: 4096,
            session_duration_secs: 3600,
            role_session_name: "costpilot-analysis".to_string(),
        }
    }
}
