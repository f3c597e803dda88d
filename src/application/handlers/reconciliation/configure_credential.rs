//! ConfigureCredentialHandler - Stores a tenant's gateway credential.

use secrecy::SecretString;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::credential::CredentialKey;
use crate::domain::foundation::TenantId;
use crate::ports::{CredentialVault, ServiceRole, VaultError};

/// Command to set one credential for a tenant.
#[derive(Debug)]
pub struct ConfigureCredentialCommand {
    pub tenant_id: TenantId,
    pub key: CredentialKey,
    pub value: SecretString,
}

#[derive(Debug, Error)]
pub enum ConfigureCredentialError {
    #[error("Credential value must not be empty")]
    EmptyValue,

    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// Handler for configuring tenant credentials.
pub struct ConfigureCredentialHandler {
    vault: Arc<dyn CredentialVault>,
    role: ServiceRole,
}

impl ConfigureCredentialHandler {
    pub fn new(vault: Arc<dyn CredentialVault>, role: ServiceRole) -> Self {
        Self { vault, role }
    }

    pub async fn handle(&self, cmd: ConfigureCredentialCommand) -> Result<(), ConfigureCredentialError> {
        use secrecy::ExposeSecret;

        if cmd.value.expose_secret().trim().is_empty() {
            return Err(ConfigureCredentialError::EmptyValue);
        }

        self.vault
            .put(&self.role, cmd.tenant_id, cmd.key, cmd.value)
            .await?;

        tracing::info!(
            tenant_id = %cmd.tenant_id,
            key = %cmd.key,
            encrypted = cmd.key.is_sensitive(),
            "Credential configured"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::crypto::AesGcmCipher;
    use crate::adapters::memory::InMemoryCredentialVault;
    use secrecy::ExposeSecret;

    fn setup() -> (Arc<InMemoryCredentialVault>, ConfigureCredentialHandler) {
        let vault = Arc::new(InMemoryCredentialVault::new(Arc::new(AesGcmCipher::new(&[9u8; 32]))));
        let handler = ConfigureCredentialHandler::new(vault.clone(), ServiceRole::assume());
        (vault, handler)
    }

    #[tokio::test]
    async fn stores_secret_encrypted() {
        let (vault, handler) = setup();
        let tenant = TenantId::new();

        handler
            .handle(ConfigureCredentialCommand {
                tenant_id: tenant,
                key: CredentialKey::WebhookSecret,
                value: SecretString::new("whsec_1".to_string()),
            })
            .await
            .unwrap();

        let stored = vault.stored_value(tenant, CredentialKey::WebhookSecret).await.unwrap();
        assert_ne!(stored, "whsec_1");
        let read = vault
            .get(&ServiceRole::assume(), tenant, CredentialKey::WebhookSecret)
            .await
            .unwrap();
        assert_eq!(read.expose_secret(), "whsec_1");
    }

    #[tokio::test]
    async fn stores_key_id_readable_by_client() {
        let (vault, handler) = setup();
        let tenant = TenantId::new();

        handler
            .handle(ConfigureCredentialCommand {
                tenant_id: tenant,
                key: CredentialKey::GatewayKeyId,
                value: SecretString::new("rzp_live_abc".to_string()),
            })
            .await
            .unwrap();

        let public = vault.get_public(tenant, CredentialKey::GatewayKeyId).await.unwrap();
        assert_eq!(public, "rzp_live_abc");
    }

    #[tokio::test]
    async fn rejects_blank_value() {
        let (_, handler) = setup();

        let err = handler
            .handle(ConfigureCredentialCommand {
                tenant_id: TenantId::new(),
                key: CredentialKey::GatewayKeySecret,
                value: SecretString::new("   ".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigureCredentialError::EmptyValue));
    }
}
