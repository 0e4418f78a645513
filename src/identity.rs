use sha2::{Digest, Sha256};
use std::fmt;

/// 32-byte symmetric key shared by everyone who knows the room secret
#[derive(Clone, PartialEq, Eq)]
pub struct CipherKey([u8; 32]);

impl CipherKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey(..)")
    }
}

/// Room id and key derived from a shared secret
///
/// `cipher_key = sha256(secret)` and `id = sha256(cipher_key)`, so the id that
/// shows up in wire tags never equals the key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomIdentity {
    cipher_key: CipherKey,
    id: [u8; 32],
}

impl RoomIdentity {
    pub fn derive(secret: &str) -> Self {
        let cipher_key: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
        let id: [u8; 32] = Sha256::digest(cipher_key).into();

        Self {
            cipher_key: CipherKey(cipher_key),
            id,
        }
    }

    pub fn cipher_key(&self) -> &CipherKey {
        &self.cipher_key
    }

    pub fn id_bytes(&self) -> &[u8; 32] {
        &self.id
    }

    /// Hex form used in the `h` tag and the subscription filter
    pub fn id(&self) -> String {
        hex::encode(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let a = RoomIdentity::derive("correct horse battery staple");
        let b = RoomIdentity::derive("correct horse battery staple");

        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_eq!(a.cipher_key().as_bytes(), b.cipher_key().as_bytes());
    }

    #[test]
    fn test_id_is_digest_of_key() {
        let identity = RoomIdentity::derive("secret");

        let expected_key: [u8; 32] = Sha256::digest(b"secret").into();
        let expected_id: [u8; 32] = Sha256::digest(expected_key).into();

        assert_eq!(identity.cipher_key().as_bytes(), &expected_key);
        assert_eq!(identity.id_bytes(), &expected_id);
        assert_ne!(identity.id(), identity.cipher_key().to_hex());
        assert_eq!(identity.id().len(), 64);
    }

    #[test]
    fn test_different_secrets_different_rooms() {
        let a = RoomIdentity::derive("room-a");
        let b = RoomIdentity::derive("room-b");

        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_debug_hides_key() {
        let identity = RoomIdentity::derive("secret");
        let rendered = format!("{:?}", identity);

        assert!(!rendered.contains(&identity.cipher_key().to_hex()));
    }
}
