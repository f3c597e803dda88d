//! SecretCipher port - Opaque encrypt/decrypt for credential envelopes.

use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("Encryption failed: {0}")]
    Encrypt(String),

    #[error("Envelope is malformed: {0}")]
    Malformed(String),

    #[error("Decryption failed")]
    Decrypt,
}

/// Encrypts plaintext into a self-contained text envelope and back.
///
/// Key management is the implementation's concern.
pub trait SecretCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;

    fn decrypt(&self, envelope: &str) -> Result<SecretString, CipherError>;
}
