// Symmetric encryption of envelope content
//
// The room only depends on the `Cipher` trait; `ChaChaCipher` is the default.

pub use chacha::ChaChaCipher;

mod chacha;

use async_trait::async_trait;
use thiserror::Error;

use crate::identity::CipherKey;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Malformed ciphertext: {0}")]
    Malformed(String),

    #[error("Ciphertext failed authentication")]
    Authentication,

    #[error("Encryption failed")]
    Encryption,

    #[error("Decrypted text is not valid UTF-8")]
    Utf8,
}

/// Encrypts envelope content with the room key
///
/// `encrypt` output must contain [`CIPHER_MARKER`](crate::event::CIPHER_MARKER)
/// so ingestion can tell ciphertext from plaintext JSON.
#[async_trait]
pub trait Cipher: Send + Sync {
    async fn encrypt(&self, plaintext: &str, key: &CipherKey) -> Result<String, CipherError>;

    async fn decrypt(&self, ciphertext: &str, key: &CipherKey) -> Result<String, CipherError>;
}
