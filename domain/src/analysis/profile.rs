//! Client profile value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Identity and placement of the account under analysis.
///
/// Supplied by the calling collaborator and read-only to the core. The
/// `identity_ref` is the IAM role ARN that the credential broker exchanges
/// for short-lived credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    /// Role ARN (or other credential handle) to assume.
    pub identity_ref: String,
    /// Default region for regional inspection tools.
    pub region: String,
    /// Region hosting the inference service, when different from `region`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_region: Option<String>,
}

impl ClientProfile {
    pub fn new(identity_ref: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            identity_ref: identity_ref.into(),
            region: region.into(),
            inference_region: None,
        }
    }

    pub fn with_inference_region(mut self, region: impl Into<String>) -> Self {
        self.inference_region = Some(region.into());
        self
    }

    /// Region the inference client should target.
    pub fn effective_inference_region(&self) -> &str {
        self.inference_region.as_deref().unwrap_or(&self.region)
    }

    /// Reject profiles the credential broker could never use.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.identity_ref.trim().is_empty() {
            return Err(DomainError::InvalidProfile(
                "identity reference cannot be empty".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(DomainError::InvalidProfile(
                "region cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_region_falls_back_to_region() {
        let profile = ClientProfile::new("arn:aws:iam::123456789012:role/Reader", "ap-south-1");
        assert_eq!(profile.effective_inference_region(), "ap-south-1");

        let profile = profile.with_inference_region("us-east-1");
        assert_eq!(profile.effective_inference_region(), "us-east-1");
    }

    #[test]
    fn validate_rejects_blank_fields() {
        assert!(ClientProfile::new("", "us-east-1").validate().is_err());
        assert!(ClientProfile::new("arn:x", "  ").validate().is_err());
        assert!(ClientProfile::new("arn:x", "us-east-1").validate().is_ok());
    }
}
