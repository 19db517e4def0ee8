//! Application layer for costpilot
//!
//! This crate contains the orchestration loop, the tool pipeline beneath it,
//! port definitions, and application configuration. It depends only on the
//! domain layer; AWS and the terminal live behind the ports.

pub mod config;
pub mod ports;
pub mod tools;
pub mod use_cases;

// Re-export commonly used types
pub use config::{AnalysisParams, DEFAULT_MAX_ITERATIONS, RetryPolicy};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    credential_broker::{AuthFault, CredentialBroker, ScopedCredentials},
    inference_client::{InferenceClient, InferenceError, InferenceRequest, InferenceResponse},
    inventory::InventoryBackend,
    progress::{AnalysisProgressNotifier, NoAnalysisProgress},
    tool_executor::{ToolExecution, ToolExecutorPort, ToolScope},
    tool_schema::ToolSchemaPort,
};
pub use tools::{
    DEFAULT_MAX_PAGES, InvokeError, Page, PaginationMerger, ResultCache, RetryingInvoker,
    ToolRegistry, Transient,
};
pub use use_cases::run_analysis::{
    CANCELLED_MESSAGE, MAX_ITERATIONS_MESSAGE, RunAnalysisInput, RunAnalysisUseCase,
};
