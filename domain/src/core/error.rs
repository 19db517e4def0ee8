//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid client profile: {0}")]
    InvalidProfile(String),

    #[error("Tool call '{0}' is not pending in the latest assistant turn")]
    UnexpectedToolResult(String),

    #[error("Tool call '{0}' already has a result")]
    DuplicateToolResult(String),

    #[error("Assistant turn requested while tool calls are still pending: {0:?}")]
    PendingToolCalls(Vec<String>),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::InvalidProfile("x".to_string()).is_cancelled());
        assert!(!DomainError::DuplicateToolResult("call_1".to_string()).is_cancelled());
    }

    #[test]
    fn test_pending_display_lists_ids() {
        let error = DomainError::PendingToolCalls(vec!["a".to_string(), "b".to_string()]);
        assert!(error.to_string().contains("\"a\""));
        assert!(error.to_string().contains("\"b\""));
    }
}
