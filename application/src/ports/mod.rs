//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod conversation_logger;
pub mod credential_broker;
pub mod inference_client;
pub mod inventory;
pub mod progress;
pub mod tool_executor;
pub mod tool_schema;
