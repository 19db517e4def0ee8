//! Remote fault classification
//!
//! Every failed call to a remote service (inventory, spend, credentials) is
//! reduced to a [`RemoteFault`]. Its [`FaultCategory`] decides what happens
//! next:
//!
//! | Category | Examples | Handling |
//! |----------|----------|----------|
//! | `Transient` | `ThrottlingException`, `RequestLimitExceeded` | retried with backoff |
//! | `Auth` | `AccessDenied`, `ExpiredToken` | surfaced immediately |
//! | `Permanent` | validation errors, timeouts, everything else | surfaced immediately |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes that signal rate limiting, throttling or temporary capacity
/// shortage.
const TRANSIENT_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestLimitExceeded",
    "RequestThrottled",
    "RequestThrottledException",
    "TooManyRequestsException",
    "ProvisionedThroughputExceededException",
    "LimitExceededException",
    "SlowDown",
    "ServiceUnavailable",
    "ServiceUnavailableException",
    "InsufficientCapacity",
];

/// Error codes that signal missing or invalid credentials.
const AUTH_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "UnauthorizedException",
    "AuthFailure",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
    "ExpiredToken",
    "ExpiredTokenException",
    "InvalidIdentityToken",
    "SignatureDoesNotMatch",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultCategory {
    Transient,
    Permanent,
    Auth,
}

impl FaultCategory {
    /// Classify an AWS-style error code.
    pub fn classify(code: &str) -> Self {
        if TRANSIENT_CODES.contains(&code) {
            FaultCategory::Transient
        } else if AUTH_CODES.contains(&code) {
            FaultCategory::Auth
        } else {
            FaultCategory::Permanent
        }
    }
}

/// A failed remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("[{code}] {message}")]
pub struct RemoteFault {
    pub code: String,
    pub message: String,
    pub category: FaultCategory,
}

impl RemoteFault {
    /// Build a fault whose category is derived from `code`.
    pub fn from_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let category = FaultCategory::classify(&code);
        Self {
            code,
            message: message.into(),
            category,
        }
    }

    pub fn transient(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category: FaultCategory::Transient,
        }
    }

    pub fn permanent(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category: FaultCategory::Permanent,
        }
    }

    pub fn auth(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category: FaultCategory::Auth,
        }
    }

    /// A call that exceeded its deadline. Never retried.
    pub fn timeout(operation: impl std::fmt::Display) -> Self {
        Self::permanent("Timeout", format!("Operation timed out: {}", operation))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self.category, FaultCategory::Transient)
    }
}
