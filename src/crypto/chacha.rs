use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    ChaCha20Poly1305, Key, Nonce,
};

use super::{Cipher, CipherError};
use crate::event::CIPHER_MARKER;
use crate::identity::CipherKey;

const NONCE_SIZE: usize = 12;

/// ChaCha20-Poly1305 with a random nonce per message
///
/// Wire form: `base64(ciphertext || tag)?iv=base64(nonce)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChaChaCipher;

impl ChaChaCipher {
    pub fn new() -> Self {
        Self
    }

    fn cipher(key: &CipherKey) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()))
    }
}

#[async_trait]
impl Cipher for ChaChaCipher {
    async fn encrypt(&self, plaintext: &str, key: &CipherKey) -> Result<String, CipherError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = Self::cipher(key)
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        Ok(format!(
            "{}{}{}",
            STANDARD.encode(ciphertext),
            CIPHER_MARKER,
            STANDARD.encode(nonce)
        ))
    }

    async fn decrypt(&self, ciphertext: &str, key: &CipherKey) -> Result<String, CipherError> {
        let (body, iv) = ciphertext
            .split_once(CIPHER_MARKER)
            .ok_or_else(|| CipherError::Malformed("missing iv marker".to_string()))?;

        let body = STANDARD
            .decode(body)
            .map_err(|e| CipherError::Malformed(format!("ciphertext: {}", e)))?;
        let iv = STANDARD
            .decode(iv)
            .map_err(|e| CipherError::Malformed(format!("iv: {}", e)))?;

        if iv.len() != NONCE_SIZE {
            return Err(CipherError::Malformed(format!(
                "iv must be {} bytes, got {}",
                NONCE_SIZE,
                iv.len()
            )));
        }

        let plaintext = Self::cipher(key)
            .decrypt(Nonce::from_slice(&iv), body.as_slice())
            .map_err(|_| CipherError::Authentication)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::Utf8)
    }
}
