//! Tool executor port
//!
//! The orchestration loop's view of the tool layer: a catalog to advertise
//! and a way to run one call within a run's scope.

use crate::tools::cache::{CacheLookup, ResultCache};
use async_trait::async_trait;
use costpilot_domain::{Arguments, ClientProfile, ToolDefinition, ToolResult, ToolSpec};

/// Per-run state shared by every tool call of that run.
#[derive(Debug)]
pub struct ToolScope {
    pub profile: ClientProfile,
    pub cache: ResultCache,
}

impl ToolScope {
    /// Fresh scope with an empty cache.
    pub fn new(profile: ClientProfile) -> Self {
        Self {
            profile,
            cache: ResultCache::new(),
        }
    }
}

/// What happened to one call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolExecution {
    /// Canonical name when the call resolved, otherwise the requested name.
    pub tool_name: String,
    pub result: ToolResult,
    /// Served from the run's cache without a remote call.
    pub cached: bool,
}

impl ToolExecution {
    pub fn new(tool_name: impl Into<String>, result: ToolResult) -> Self {
        Self {
            tool_name: tool_name.into(),
            result,
            cached: false,
        }
    }

    pub fn from_lookup(tool_name: impl Into<String>, lookup: CacheLookup) -> Self {
        Self {
            tool_name: tool_name.into(),
            result: lookup.result,
            cached: lookup.cached,
        }
    }
}

#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Get the catalog of all available tools
    fn tool_spec(&self) -> &ToolSpec;

    /// Look up a tool by canonical name or alias
    fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tool_spec().get_resolved(name)
    }

    /// Get names of all available tools
    fn available_tools(&self) -> Vec<&str> {
        self.tool_spec().names().collect()
    }

    /// Run one call. Never fails: every problem becomes a `Failure` result.
    async fn execute(&self, scope: &ToolScope, name: &str, arguments: &Arguments) -> ToolExecution;
}
