//! CredentialVault port - Per-tenant gateway secrets.
//!
//! The vault is the one place an attacker could learn another tenant's
//! gateway secret, so every read of a sensitive value requires a
//! [`ServiceRole`]. Request-scoped code never holds one; it is created at the
//! composition root and handed to the handlers that need it.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::domain::credential::CredentialKey;
use crate::domain::foundation::TenantId;

/// Capability marker for the trusted execution context.
#[derive(Debug, Clone)]
pub struct ServiceRole {
    _private: (),
}

impl ServiceRole {
    /// Assumes the elevated role.
    ///
    /// Call only from process setup or operator tooling.
    pub fn assume() -> Self {
        Self { _private: () }
    }
}

/// Errors raised by vault implementations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No configuration row for this tenant/key pair.
    #[error("Credential '{key}' not configured for tenant {tenant_id}")]
    NotFound {
        tenant_id: TenantId,
        key: CredentialKey,
    },

    /// Stored envelope could not be opened.
    #[error("Credential '{key}' could not be decrypted: {reason}")]
    Decryption { key: CredentialKey, reason: String },

    /// A sensitive key was requested without elevation.
    #[error("Credential '{0}' is sensitive")]
    Forbidden(CredentialKey),

    /// Backing store failure.
    #[error("Vault storage error: {0}")]
    Storage(String),
}

/// Port for reading and writing tenant credentials.
#[async_trait]
pub trait CredentialVault: Send + Sync {
    /// Returns the plaintext credential.
    ///
    /// Sensitive keys are decrypted; non-sensitive keys are returned verbatim.
    async fn get(
        &self,
        role: &ServiceRole,
        tenant_id: TenantId,
        key: CredentialKey,
    ) -> Result<SecretString, VaultError>;

    /// Stores a credential, encrypting it if the key is sensitive.
    ///
    /// Replaces any existing value for the same tenant/key pair.
    async fn put(
        &self,
        role: &ServiceRole,
        tenant_id: TenantId,
        key: CredentialKey,
        value: SecretString,
    ) -> Result<(), VaultError>;

    /// Reads a non-sensitive credential for an unprivileged caller.
    async fn get_public(
        &self,
        tenant_id: TenantId,
        key: CredentialKey,
    ) -> Result<String, VaultError> {
        if key.is_sensitive() {
            return Err(VaultError::Forbidden(key));
        }
        let value = self.get(&ServiceRole::assume(), tenant_id, key).await?;
        Ok(value.expose_secret().clone())
    }
}
