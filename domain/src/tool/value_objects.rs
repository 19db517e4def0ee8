//! Tool domain value objects
//!
//! Every tool invocation produces exactly one [`ToolResult`], which is
//! serialized verbatim into the transcript as the tool-result payload.
//!
//! | Code | Recoverable | Meaning |
//! |------|-------------|---------|
//! | `UnknownTool` | no | name is neither a catalog entry nor an alias |
//! | `InvalidArgument` | yes | missing/mistyped/unknown parameter, the model can fix it |
//! | AWS error code | no | remote fault (after retries for transient codes) |

use crate::fault::RemoteFault;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error codes produced locally, before any remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolErrorCode {
    UnknownTool,
    InvalidArgument,
}

impl ToolErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ToolErrorCode::UnknownTool => "UnknownTool",
            ToolErrorCode::InvalidArgument => "InvalidArgument",
        }
    }
}

impl std::fmt::Display for ToolErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one tool invocation.
///
/// Failures are data, not errors: they are handed back to the model, which
/// decides what to do next. `recoverable` is advisory and never triggers an
/// automatic retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ToolResult {
    #[serde(rename = "success")]
    Success { data: Value },
    #[serde(rename = "error")]
    Failure {
        error_code: String,
        message: String,
        recoverable: bool,
    },
}

impl ToolResult {
    pub fn success(data: Value) -> Self {
        ToolResult::Success { data }
    }

    pub fn failure(error_code: impl Into<String>, message: impl Into<String>, recoverable: bool) -> Self {
        ToolResult::Failure {
            error_code: error_code.into(),
            message: message.into(),
            recoverable,
        }
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::failure(
            ToolErrorCode::UnknownTool.as_str(),
            format!("Unknown tool: {}", name),
            false,
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::failure(ToolErrorCode::InvalidArgument.as_str(), message, true)
    }

    /// Failure carrying a remote fault's code and message.
    pub fn remote(fault: &RemoteFault) -> Self {
        Self::failure(fault.code.clone(), fault.message.clone(), false)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            ToolResult::Success { data } => Some(data),
            ToolResult::Failure { .. } => None,
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            ToolResult::Success { .. } => None,
            ToolResult::Failure { error_code, .. } => Some(error_code),
        }
    }

    /// JSON payload stored in the transcript.
    pub fn to_payload(&self) -> Value {
        match self {
            ToolResult::Success { data } => serde_json::json!({
                "status": "success",
                "data": data,
            }),
            ToolResult::Failure {
                error_code,
                message,
                recoverable,
            } => serde_json::json!({
                "status": "error",
                "error_code": error_code,
                "message": message,
                "recoverable": recoverable,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_payload_shape() {
        let result = ToolResult::success(json!({"data_type": "s3_buckets", "data": []}));
        let payload = result.to_payload();
        assert_eq!(payload["status"], "success");
        assert_eq!(payload["data"]["data_type"], "s3_buckets");
        assert_eq!(serde_json::to_value(&result).unwrap(), payload);
    }

    #[test]
    fn unknown_tool_is_not_recoverable() {
        let result = ToolResult::unknown_tool("delete_everything");
        assert_eq!(result.error_code(), Some("UnknownTool"));
        assert_eq!(
            result.to_payload(),
            json!({
                "status": "error",
                "error_code": "UnknownTool",
                "message": "Unknown tool: delete_everything",
                "recoverable": false,
            })
        );
    }

    #[test]
    fn invalid_argument_is_recoverable() {
        let result = ToolResult::invalid_argument("Missing required parameter 'instance_id'");
        assert!(matches!(result, ToolResult::Failure { recoverable: true, .. }));
        assert!(!result.is_success());
        assert!(result.data().is_none());
    }

    #[test]
    fn remote_fault_keeps_aws_code() {
        let fault = RemoteFault::from_code("AccessDenied", "User is not authorized");
        let result = ToolResult::remote(&fault);
        assert_eq!(result.error_code(), Some("AccessDenied"));
        assert!(matches!(result, ToolResult::Failure { recoverable: false, .. }));
    }

    #[test]
    fn deserializes_from_payload() {
        let back: ToolResult = serde_json::from_value(json!({
            "status": "error",
            "error_code": "Timeout",
            "message": "Operation timed out",
            "recoverable": false,
        }))
        .unwrap();
        assert_eq!(back.error_code(), Some("Timeout"));
    }
}
