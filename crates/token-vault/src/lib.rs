//! At-rest encryption for third-party access tokens.
//!
//! Integration credentials are sealed with XSalsa20Poly1305 (secretbox)
//! under a single process-wide key loaded from configuration at startup.
//! The stored form is base64 of `nonce || ciphertext`.
//!
//! A failed [`TokenVault::decrypt`] means the stored credential is unusable;
//! callers deactivate the integration rather than propagate the failure.

use std::env;

use base64::Engine;
use rand_core::{OsRng, RngCore};
use thiserror::Error;
use xsalsa20poly1305::aead::{Aead, KeyInit};
use xsalsa20poly1305::{Key, Nonce, XSalsa20Poly1305};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No key was configured.
    #[error("missing encryption key")]
    MissingKey,

    /// Key material decoded to the wrong length.
    #[error("invalid encryption key length: {0}")]
    InvalidKeyLength(usize),

    /// Ciphertext too short to contain a nonce.
    #[error("invalid ciphertext length: {0}")]
    InvalidCiphertextLength(usize),

    /// Stored value was not valid base64.
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Key material was not valid hex.
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Authenticated decryption failed (tampered or foreign ciphertext).
    #[error("decryption failure")]
    Decryption,

    /// Decrypted bytes were not valid UTF-8.
    #[error("plaintext is not valid UTF-8")]
    InvalidPlaintext,
}

/// Encrypts and decrypts integration tokens with a process-wide key.
#[derive(Clone)]
pub struct TokenVault {
    key: [u8; KEY_LEN],
}

impl std::fmt::Debug for TokenVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("TokenVault").finish_non_exhaustive()
    }
}

impl TokenVault {
    /// Build a vault from an environment variable holding the key.
    pub fn from_env(var: &str) -> Result<Self, VaultError> {
        let value = env::var(var).map_err(|_| VaultError::MissingKey)?;
        Self::from_key_str(&value)
    }

    /// Build a vault from a key string (base64, hex, or `hex:`-prefixed hex).
    pub fn from_key_str(value: &str) -> Result<Self, VaultError> {
        let key = decode_key(value)?;
        Ok(Self { key })
    }

    /// Encrypt a token for storage.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let cipher = XSalsa20Poly1305::new(Key::from_slice(&self.key));
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::Decryption)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(sealed))
    }

    /// Decrypt a stored token.
    pub fn decrypt(&self, stored: &str) -> Result<String, VaultError> {
        let sealed = base64::engine::general_purpose::STANDARD.decode(stored.trim())?;
        if sealed.len() < NONCE_LEN {
            return Err(VaultError::InvalidCiphertextLength(sealed.len()));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let cipher = XSalsa20Poly1305::new(Key::from_slice(&self.key));
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| VaultError::Decryption)?;

        String::from_utf8(plaintext).map_err(|_| VaultError::InvalidPlaintext)
    }
}

fn decode_key(value: &str) -> Result<[u8; KEY_LEN], VaultError> {
    let trimmed = value.trim();
    let bytes = if let Some(hex_value) = trimmed.strip_prefix("hex:") {
        hex::decode(hex_value)?
    } else if is_probably_hex(trimmed) {
        hex::decode(trimmed)?
    } else {
        base64::engine::general_purpose::STANDARD.decode(trimmed)?
    };

    if bytes.len() != KEY_LEN {
        return Err(VaultError::InvalidKeyLength(bytes.len()));
    }

    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&bytes);
    Ok(key)
}

fn is_probably_hex(value: &str) -> bool {
    value.len() == KEY_LEN * 2 && value.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_vault() -> TokenVault {
        TokenVault::from_key_str(&"a".repeat(KEY_LEN * 2)).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let vault = test_vault();
        let sealed = vault.encrypt("gho_example_token").unwrap();
        assert_ne!(sealed, "gho_example_token");
        assert_eq!(vault.decrypt(&sealed).unwrap(), "gho_example_token");
    }

    #[test]
    fn test_nonce_varies_per_encryption() {
        let vault = test_vault();
        let a = vault.encrypt("same input").unwrap();
        let b = vault.encrypt("same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let vault = test_vault();
        let sealed = vault.encrypt("secret").unwrap();
        let mut bytes = base64::engine::general_purpose::STANDARD
            .decode(&sealed)
            .unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = base64::engine::general_purpose::STANDARD.encode(bytes);

        assert!(matches!(
            vault.decrypt(&tampered),
            Err(VaultError::Decryption)
        ));
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let vault = test_vault();
        let short = base64::engine::general_purpose::STANDARD.encode([0u8; 8]);
        assert!(matches!(
            vault.decrypt(&short),
            Err(VaultError::InvalidCiphertextLength(8))
        ));
    }

    #[test]
    fn test_not_base64_fails() {
        let vault = test_vault();
        assert!(matches!(
            vault.decrypt("%%not-base64%%"),
            Err(VaultError::Base64(_))
        ));
    }

    #[test]
    fn test_wrong_key_cannot_decrypt() {
        let vault = test_vault();
        let other = TokenVault::from_key_str(&"b".repeat(KEY_LEN * 2)).unwrap();
        let sealed = vault.encrypt("secret").unwrap();
        assert!(matches!(other.decrypt(&sealed), Err(VaultError::Decryption)));
    }

    #[test]
    fn test_key_length_validated() {
        let result = TokenVault::from_key_str("deadbeef");
        assert!(matches!(result, Err(VaultError::InvalidKeyLength(4))));
    }

    #[test]
    fn test_base64_key_accepted() {
        let key = base64::engine::general_purpose::STANDARD.encode([7u8; KEY_LEN]);
        assert!(TokenVault::from_key_str(&key).is_ok());
    }
}
