//! Credential vault configuration

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

const MASTER_KEY_LEN: usize = 32;

/// Vault configuration
#[derive(Debug, Deserialize)]
pub struct VaultConfig {
    /// Base64-encoded 32-byte AES-256 key for credentials at rest
    pub master_key: SecretString,
}

impl VaultConfig {
    /// Validate vault configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let encoded = self.master_key.expose_secret().trim();
        if encoded.is_empty() {
            return Err(ValidationError::MissingRequired("VAULT__MASTER_KEY"));
        }
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|_| ValidationError::InvalidMasterKey)?;
        if decoded.len() != MASTER_KEY_LEN {
            return Err(ValidationError::InvalidMasterKey);
        }
        Ok(())
    }
}
