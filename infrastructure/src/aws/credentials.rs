//! STS credential broker
//!
//! Implements [`CredentialBroker`] with `sts:AssumeRole`. Every call is a
//! fresh exchange; nothing is cached.

use super::fault::remote_fault;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sts::Client as StsClient;
use chrono::{DateTime, Utc};
use costpilot_application::{AuthFault, CredentialBroker, ScopedCredentials};
use costpilot_domain::RemoteFault;
use std::time::Duration;
use tracing::{debug, warn};

/// Default `RoleSessionName`.
pub const DEFAULT_SESSION_NAME: &str = "costpilot-analysis";

pub struct StsCredentialBroker {
    client: StsClient,
    session_name: String,
}

impl StsCredentialBroker {
    /// Broker that assumes roles using the base identity in `config`.
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: StsClient::new(config),
            session_name: DEFAULT_SESSION_NAME.to_string(),
        }
    }

    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = session_name.into();
        self
    }
}

#[async_trait]
impl CredentialBroker for StsCredentialBroker {
    async fn assume(
        &self,
        identity_ref: &str,
        session_duration: Duration,
    ) -> Result<ScopedCredentials, AuthFault> {
        debug!(
            role = identity_ref,
            duration_secs = session_duration.as_secs(),
            "Assuming role"
        );

        let response = self
            .client
            .assume_role()
            .role_arn(identity_ref)
            .role_session_name(&self.session_name)
            .duration_seconds(duration_seconds(session_duration))
            .send()
            .await
            .map_err(|e| {
                let fault = remote_fault("AssumeRole", &e);
                warn!("Failed to assume role {}: {}", identity_ref, fault);
                AuthFault::new(identity_ref, fault)
            })?;

        let Some(credentials) = response.credentials() else {
            return Err(AuthFault::new(
                identity_ref,
                RemoteFault::permanent("InvalidResponse", "AssumeRole returned no credentials"),
            ));
        };

        let mut scoped = ScopedCredentials::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            credentials.session_token(),
        );
        let expiration = credentials.expiration();
        if let Some(expires_at) =
            DateTime::<Utc>::from_timestamp(expiration.secs(), expiration.subsec_nanos())
        {
            scoped = scoped.with_expiry(expires_at);
        }
        if let Some(account_id) = response
            .assumed_role_user()
            .and_then(|user| account_from_arn(user.arn()))
        {
            scoped = scoped.with_account_id(account_id);
        }

        debug!(role = identity_ref, "Assumed role");
        Ok(scoped)
    }
}

/// STS takes `DurationSeconds` as an `i32`.
fn duration_seconds(duration: Duration) -> i32 {
    i32::try_from(duration.as_secs()).unwrap_or(i32::MAX)
}

/// Account id field of an ARN (`arn:partition:service:region:account:resource`).
pub fn account_from_arn(arn: &str) -> Option<&str> {
    arn.split(':')
        .nth(4)
        .filter(|account| !account.is_empty())
}
