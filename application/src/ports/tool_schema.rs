//! Tool schema conversion port.
//!
//! The domain decides which tools exist; this port decides how they are
//! serialized for the inference API (JSON Schema).

use costpilot_domain::{ToolDefinition, ToolSpec};
use serde_json::Value;

pub trait ToolSchemaPort: Send + Sync {
    /// Convert a single tool definition to provider-neutral JSON Schema.
    fn tool_to_schema(&self, tool: &ToolDefinition) -> Value;

    /// Convert the whole catalog, in name order.
    fn all_tools_schema(&self, spec: &ToolSpec) -> Vec<Value> {
        spec.all().map(|tool| self.tool_to_schema(tool)).collect()
    }
}
