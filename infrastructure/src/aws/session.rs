//! SDK configuration for the caller's own identity and for assumed roles.
//!
//! The SDK's retry layer is disabled everywhere: throttling is retried by the
//! application's `RetryingInvoker`, which also re-exchanges credentials on
//! every attempt.

use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_sts::config::{Credentials, SharedCredentialsProvider};
use costpilot_application::ScopedCredentials;
use std::time::SystemTime;

/// Provider name reported by credentials built from an AssumeRole response.
const ASSUMED_ROLE_PROVIDER: &str = "costpilot-assume-role";

/// Configuration from the default credential chain (or a named profile).
pub async fn base_config(profile: Option<&str>, region: &str) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .retry_config(RetryConfig::disabled());

    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }

    loader.load().await
}

/// Configuration that signs with assumed-role credentials in `region`.
pub fn scoped_config(credentials: &ScopedCredentials, region: &str) -> SdkConfig {
    let credentials = Credentials::new(
        credentials.access_key_id.clone(),
        credentials.secret_access_key.clone(),
        Some(credentials.session_token.clone()),
        credentials.expires_at.map(SystemTime::from),
        ASSUMED_ROLE_PROVIDER,
    );

    SdkConfig::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(SharedCredentialsProvider::new(credentials))
        .retry_config(RetryConfig::disabled())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_config_targets_region_without_sdk_retries() {
        let creds = ScopedCredentials::new("AKIA", "secret", "token");
        let config = scoped_config(&creds, "eu-central-1");

        assert_eq!(config.region().map(|r| r.as_ref()), Some("eu-central-1"));
        assert!(config.credentials_provider().is_some());
        assert_eq!(config.retry_config().map(|r| r.max_attempts()), Some(1));
    }
}
