//! Credential broker port
//!
//! Exchanges the profile's identity reference (a role ARN) for short-lived,
//! scoped credentials. Nothing is cached: every inspection attempt performs
//! its own exchange.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use costpilot_domain::RemoteFault;
use std::time::Duration;
use thiserror::Error;

/// Temporary credentials for one account.
#[derive(Clone)]
pub struct ScopedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    /// Account the credentials belong to, when the exchange reports it.
    pub account_id: Option<String>,
}

impl ScopedCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
            expires_at: None,
            account_id: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }
}

impl std::fmt::Debug for ScopedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Credential exchange failure.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Role assumption failed for {identity_ref}: {fault}")]
pub struct AuthFault {
    pub identity_ref: String,
    pub fault: RemoteFault,
}

impl AuthFault {
    pub fn new(identity_ref: impl Into<String>, fault: RemoteFault) -> Self {
        Self {
            identity_ref: identity_ref.into(),
            fault,
        }
    }
}

impl From<AuthFault> for RemoteFault {
    /// Keeps the remote code and category so throttled exchanges are retried.
    fn from(err: AuthFault) -> Self {
        RemoteFault {
            code: err.fault.code,
            message: format!("Role assumption failed: {}", err.fault.message),
            category: err.fault.category,
        }
    }
}

/// Port for the credential exchange.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    async fn assume(
        &self,
        identity_ref: &str,
        session_duration: Duration,
    ) -> Result<ScopedCredentials, AuthFault>;
}
