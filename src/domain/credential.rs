//! Per-tenant gateway credential names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Name of a per-tenant gateway credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKey {
    /// Public key id handed to the checkout client.
    GatewayKeyId,
    /// Private API secret; also signs direct confirmations.
    GatewayKeySecret,
    /// Secret the gateway signs webhook bodies with.
    WebhookSecret,
}

impl CredentialKey {
    /// Sensitive values are stored encrypted and never returned to a
    /// non-elevated caller.
    pub fn is_sensitive(&self) -> bool {
        !matches!(self, CredentialKey::GatewayKeyId)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::GatewayKeyId => "gateway_key_id",
            CredentialKey::GatewayKeySecret => "gateway_key_secret",
            CredentialKey::WebhookSecret => "webhook_secret",
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CredentialKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gateway_key_id" => Ok(CredentialKey::GatewayKeyId),
            "gateway_key_secret" => Ok(CredentialKey::GatewayKeySecret),
            "webhook_secret" => Ok(CredentialKey::WebhookSecret),
            other => Err(ValidationError::invalid_format(
                "key_name",
                format!("unknown credential '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_key_id_is_non_sensitive() {
        assert!(!CredentialKey::GatewayKeyId.is_sensitive());
        assert!(CredentialKey::GatewayKeySecret.is_sensitive());
        assert!(CredentialKey::WebhookSecret.is_sensitive());
    }

    #[test]
    fn parses_storage_names() {
        for key in [
            CredentialKey::GatewayKeyId,
            CredentialKey::GatewayKeySecret,
            CredentialKey::WebhookSecret,
        ] {
            assert_eq!(key.as_str().parse::<CredentialKey>().unwrap(), key);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!("razorpay_key".parse::<CredentialKey>().is_err());
    }
}
