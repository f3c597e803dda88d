//! PostgreSQL implementation of CredentialVault.
//!
//! Sensitive values are stored as cipher envelopes with `is_encrypted = true`.
//! Decryption is attempted only for keys flagged sensitive.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::credential::CredentialKey;
use crate::domain::foundation::TenantId;
use crate::ports::{CredentialVault, SecretCipher, ServiceRole, VaultError};

pub struct PostgresCredentialVault {
    pool: PgPool,
    cipher: Arc<dyn SecretCipher>,
}

impl PostgresCredentialVault {
    pub fn new(pool: PgPool, cipher: Arc<dyn SecretCipher>) -> Self {
        Self { pool, cipher }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    value: String,
}

#[async_trait]
impl CredentialVault for PostgresCredentialVault {
    async fn get(
        &self,
        _role: &ServiceRole,
        tenant_id: TenantId,
        key: CredentialKey,
    ) -> Result<SecretString, VaultError> {
        let row: Option<CredentialRow> = sqlx::query_as(
            "SELECT value FROM tenant_credentials WHERE tenant_id = $1 AND key_name = $2",
        )
        .bind(tenant_id.as_uuid())
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| VaultError::Storage(e.to_string()))?;

        let row = row.ok_or(VaultError::NotFound { tenant_id, key })?;

        if key.is_sensitive() {
            self.cipher
                .decrypt(&row.value)
                .map_err(|e| VaultError::Decryption {
                    key,
                    reason: e.to_string(),
                })
        } else {
            Ok(SecretString::new(row.value))
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

        sqlx::query(
            r#"
            INSERT INTO tenant_credentials (tenant_id, key_name, value, is_encrypted, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (tenant_id, key_name)
            DO UPDATE SET value = EXCLUDED.value,
                          is_encrypted = EXCLUDED.is_encrypted,
                          updated_at = NOW()
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(key.as_str())
        .bind(stored)
        .bind(key.is_sensitive())
        .execute(&self.pool)
        .await
        .map_err(|e| VaultError::Storage(e.to_string()))?;

        Ok(())
    }
}
