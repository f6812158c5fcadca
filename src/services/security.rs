use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

/// Length of an AES-GCM nonce in bytes
const NONCE_LEN: usize = 12;

/// Errors raised while setting up or using the token cipher
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("token encryption key required")]
    MissingKey,

    #[error("invalid token encryption key: {0}")]
    InvalidKey(String),

    #[error("token encryption failed: {0}")]
    Encrypt(String),
}

/// Encrypts calendar refresh tokens at rest with AES-256-GCM
///
/// Tokens are rendered as base64 of `nonce || ciphertext`.
#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl TokenCipher {
    /// Build a cipher from a base64-encoded 32-byte key
    pub fn from_base64_key(key: &str) -> Result<Self, CipherError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CipherError::MissingKey);
        }

        let bytes = STANDARD
            .decode(key)
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(CipherError::InvalidKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&bytes)
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;

        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CipherError::Encrypt(e.to_string()))?;

        let mut out = nonce.to_vec();
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }

    /// Decrypt a token, `None` when it was not produced by this key
    pub fn decrypt(&self, token: &str) -> Option<String> {
        let bytes = STANDARD.decode(token).ok()?;
        if bytes.len() <= NONCE_LEN {
            return None;
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .ok()?;

        String::from_utf8(plaintext).ok()
    }
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> String {
        STANDARD.encode([byte; 32])
    }

    #[test]
    fn test_encrypt_then_decrypt() {
        let cipher = TokenCipher::from_base64_key(&key(7)).unwrap();
        let token = cipher.encrypt("google-refresh-token").unwrap();

        assert_ne!(token, "google-refresh-token");
        assert_eq!(cipher.decrypt(&token).as_deref(), Some("google-refresh-token"));
    }

    #[test]
    fn test_foreign_token_rejected() {
        let ours = TokenCipher::from_base64_key(&key(1)).unwrap();
        let theirs = TokenCipher::from_base64_key(&key(2)).unwrap();
        let token = theirs.encrypt("secret").unwrap();

        assert_eq!(ours.decrypt(&token), None);
        assert_eq!(ours.decrypt("not base64!"), None);
    }

    #[test]
    fn test_key_validation() {
        assert!(matches!(TokenCipher::from_base64_key(""), Err(CipherError::MissingKey)));
        assert!(matches!(
            TokenCipher::from_base64_key(&STANDARD.encode([0u8; 16])),
            Err(CipherError::InvalidKey(_))
        ));
    }
}
