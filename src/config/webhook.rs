//! Webhook intake configuration

use axum::http::HeaderName;
use serde::Deserialize;

use super::error::ValidationError;

/// Webhook configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Header carrying the gateway's HMAC signature
    #[serde(default = "default_signature_header")]
    pub signature_header: String,

    /// Event names that are reconciled (comma-separated)
    #[serde(default = "default_handled_events")]
    pub handled_events: String,

    /// Largest accepted notification body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl WebhookConfig {
    /// Get handled events as a vector
    pub fn handled_events_list(&self) -> Vec<String> {
        self.handled_events
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Signature header as a typed header name
    pub fn signature_header_name(&self) -> Result<HeaderName, ValidationError> {
        HeaderName::from_bytes(self.signature_header.trim().to_ascii_lowercase().as_bytes())
            .map_err(|_| ValidationError::InvalidSignatureHeader)
    }

    /// Validate webhook configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.signature_header_name()?;
        if self.handled_events_list().is_empty() {
            return Err(ValidationError::NoHandledEvents);
        }
        if !(1024..=1024 * 1024).contains(&self.max_body_bytes) {
            return Err(ValidationError::InvalidBodyLimit);
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            signature_header: default_signature_header(),
            handled_events: default_handled_events(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_signature_header() -> String {
    "x-razorpay-signature".to_string()
}

fn default_handled_events() -> String {
    "payment.captured,order.paid".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = WebhookConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.handled_events_list(),
            vec!["payment.captured".to_string(), "order.paid".to_string()]
        );
    }

    #[test]
    fn test_handled_events_parsing_skips_blanks() {
        let config = WebhookConfig {
            handled_events: " payment.captured , ,order.paid ".to_string(),
            ..Default::default()
        };
        assert_eq!(config.handled_events_list().len(), 2);
    }

    #[test]
    fn test_empty_event_list_rejected() {
        let config = WebhookConfig {
            handled_events: " , ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::NoHandledEvents)));
    }

    #[test]
    fn test_header_name_is_normalised() {
        let config = WebhookConfig {
            signature_header: "X-Gateway-Signature".to_string(),
            ..Default::default()
        };
        assert_eq!(config.signature_header_name().unwrap().as_str(), "x-gateway-signature");
    }

    #[test]
    fn test_invalid_header_rejected() {
        let config = WebhookConfig {
            signature_header: "bad header".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_body_limit_bounds() {
        let config = WebhookConfig {
            max_body_bytes: 10,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidBodyLimit)));
    }
}
