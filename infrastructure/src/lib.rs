//! Infrastructure layer for costpilot
//!
//! Adapters implementing the ports defined in the application layer:
//! AWS credential exchange and inventory calls, the Bedrock inference
//! client, tool schema conversion, conversation logging and configuration
//! file loading.

pub mod aws;
pub mod config;
pub mod logging;
pub mod providers;
pub mod tools;

// Re-export commonly used types
pub use aws::{AwsInventoryBackend, StsCredentialBroker, base_config, scoped_config};
pub use config::{
    ConfigLoadError, ConfigLoader, ConfigValidationError, FileAnalysisConfig, FileAwsConfig,
    FileConfig, FileLoggingConfig, FileRetryConfig,
};
pub use logging::JsonlConversationLogger;
pub use providers::BedrockInferenceClient;
pub use tools::JsonSchemaToolConverter;
