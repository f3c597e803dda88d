//! In-memory credential vault.
//!
//! Stores sensitive values as cipher envelopes, like the Postgres vault, so
//! decryption failures surface the same way.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::credential::CredentialKey;
use crate::domain::foundation::TenantId;
use crate::ports::{CredentialVault, SecretCipher, ServiceRole, VaultError};

#[derive(Clone)]
pub struct InMemoryCredentialVault {
    values: Arc<RwLock<HashMap<(TenantId, CredentialKey), String>>>,
    cipher: Arc<dyn SecretCipher>,
}

impl InMemoryCredentialVault {
    pub fn new(cipher: Arc<dyn SecretCipher>) -> Self {
        Self {
            values: Arc::new(RwLock::new(HashMap::new())),
            cipher,
        }
    }

    /// Stored representation, for asserting that secrets are not plaintext.
    pub async fn stored_value(&self, tenant_id: TenantId, key: CredentialKey) -> Option<String> {
        self.values.read().await.get(&(tenant_id, key)).cloned()
    }
}

#[async_trait]
impl CredentialVault for InMemoryCredentialVault {
    async fn get(
        &self,
        _role: &ServiceRole,
        tenant_id: TenantId,
        key: CredentialKey,
    ) -> Result<SecretString, VaultError> {
        let stored = self
            .stored_value(tenant_id, key)
            .await
            .ok_or(VaultError::NotFound { tenant_id, key })?;

        if key.is_sensitive() {
            self.cipher
                .decrypt(&stored)
                .map_err(|e| VaultError::Decryption {
                    key,
                    reason: e.to_string(),
                })
        } else {
            Ok(SecretString::new(stored))
        }
    }

    async fn put(
        &self,
        _role: &ServiceRole,
        tenant_id: TenantId,
        key: CredentialKey,
        value: SecretString,
    ) -> Result<(), VaultError> {
        let stored = if key.is_sensitive() {
            self.cipher
                .encrypt(value.expose_secret())
                .map_err(|e| VaultError::Storage(e.to_string()))?
        } else {
            value.expose_secret().clone()
        };
        self.values.write().await.insert((tenant_id, key), stored);
        Ok(())
    }
}
