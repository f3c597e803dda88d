//! AES-256-GCM credential envelope.
//!
//! Envelope format: `base64(nonce ‖ ciphertext ‖ tag)` with a fresh 96-bit
//! nonce per encryption.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};

use crate::ports::{CipherError, SecretCipher};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// [`SecretCipher`] backed by a single AES-256 master key.
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    /// Creates a cipher from raw key bytes.
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    /// Creates a cipher from a base64-encoded 32-byte key.
    pub fn from_base64_key(encoded: &SecretString) -> Result<Self, CipherError> {
        let bytes = STANDARD
            .decode(encoded.expose_secret().trim())
            .map_err(|e| CipherError::Malformed(format!("master key base64: {e}")))?;
        let key: [u8; KEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
            CipherError::Malformed(format!(
                "master key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::new(&key))
    }
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCipher").finish_non_exhaustive()
    }
}

impl SecretCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CipherError::Encrypt(format!("AES-GCM encrypt: {e}")))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(combined))
    }

    fn decrypt(&self, envelope: &str) -> Result<SecretString, CipherError> {
        let combined = STANDARD
            .decode(envelope)
            .map_err(|e| CipherError::Malformed(format!("base64 decode: {e}")))?;

        if combined.len() <= NONCE_LEN {
            return Err(CipherError::Malformed("ciphertext too short".into()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::Decrypt)?;

        String::from_utf8(plaintext)
            .map(SecretString::new)
            .map_err(|_| CipherError::Malformed("plaintext is not UTF-8".into()))
    }
}
