//! Configuration file loading for costpilot
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `COSTPILOT_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./costpilot.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/costpilot/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_MODEL_ID, FileAnalysisConfig, FileAwsConfig, FileConfig,
    FileLoggingConfig, FileRetryConfig, STS_SESSION_RANGE,
};
pub use loader::{ConfigLoadError, ConfigLoader, ENV_PREFIX, PROJECT_CONFIG_FILE};
