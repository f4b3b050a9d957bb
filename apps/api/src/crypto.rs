//! # Field Encryption
//!
//! Encrypts free-text order notes at rest with AES-256-GCM.
//!
//! ```text
//! FIELD_ENCRYPTION_KEY ──argon2──► 32-byte key
//!
//! "entregar en porteria"
//!      │ encrypt (random 96-bit nonce)
//!      ▼
//! "enc:v1:" + base64(nonce ‖ ciphertext ‖ tag)   ← stored in orders.notes
//! ```
//!
//! Stored values without the `enc:v1:` prefix are returned unchanged, so rows
//! written before encryption was turned on stay readable.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use argon2::Argon2;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{ServiceError, ServiceResult};

const PREFIX: &str = "enc:v1:";
const NONCE_LEN: usize = 12;
const KEY_SALT: &[u8] = b"ventas.order-notes.v1";

/// Symmetric cipher for sensitive text columns.
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldCipher(..)")
    }
}

impl FieldCipher {
    /// Derives the key from a secret of any length.
    pub fn from_secret(secret: &str) -> ServiceResult<Self> {
        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(secret.as_bytes(), KEY_SALT, &mut key)
            .map_err(|e| ServiceError::Crypto(format!("key derivation failed: {e}")))?;

        Ok(FieldCipher {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
        })
    }

    pub fn encrypt(&self, plaintext: &str) -> ServiceResult<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| ServiceError::Crypto("encryption failed".to_string()))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);

        Ok(format!("{PREFIX}{}", STANDARD.encode(payload)))
    }

    pub fn decrypt(&self, stored: &str) -> ServiceResult<String> {
        let Some(encoded) = stored.strip_prefix(PREFIX) else {
            return Ok(stored.to_string());
        };

        let payload = STANDARD
            .decode(encoded)
            .map_err(|_| ServiceError::Crypto("malformed ciphertext".to_string()))?;
        if payload.len() <= NONCE_LEN {
            return Err(ServiceError::Crypto("ciphertext too short".to_string()));
        }

        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| ServiceError::Crypto("decryption failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| ServiceError::Crypto("plaintext is not UTF-8".to_string()))
    }

    pub fn encrypt_opt(&self, value: Option<&str>) -> ServiceResult<Option<String>> {
        value.map(|v| self.encrypt(v)).transpose()
    }

    pub fn decrypt_opt(&self, value: Option<&str>) -> ServiceResult<Option<String>> {
        value.map(|v| self.decrypt(v)).transpose()
    }
}
