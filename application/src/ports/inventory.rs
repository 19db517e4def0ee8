//! Inventory backend port
//!
//! Executes one resolved, validated inspection against the remote account.
//! Retry, caching and credential exchange all happen above this port.

use super::credential_broker::ScopedCredentials;
use async_trait::async_trait;
use costpilot_domain::{Arguments, InspectionTool, RemoteFault};
use serde_json::Value;

#[async_trait]
pub trait InventoryBackend: Send + Sync {
    /// Reject `arguments` the backend could never send, before any
    /// credentials are exchanged. The message is shown to the model.
    fn check(&self, _tool: InspectionTool, _arguments: &Arguments) -> Result<(), String> {
        Ok(())
    }

    /// Run `tool` with normalized `arguments`.
    ///
    /// Returns the response envelope (`data_type`, `region`, `timestamp`,
    /// `data`, …) on success.
    async fn invoke(
        &self,
        tool: InspectionTool,
        arguments: &Arguments,
        credentials: &ScopedCredentials,
    ) -> Result<Value, RemoteFault>;
}
