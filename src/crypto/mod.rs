//! Field-level encryption at rest, modeled as an explicit capability that the
//! persistence layer invokes per designated field. Plaintext names are never
//! queryable; lookups go through a one-way digest instead.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("field encryption failed")]
    Encrypt,
    #[error("field decryption failed")]
    Decrypt,
    #[error("ciphertext is not valid base64: {0}")]
    Encoding(String),
}

/// Encrypt/decrypt capability for designated secret fields.
pub trait FieldCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;
}

/// AES-256-GCM cipher keyed from the configured encryption key. The signing
/// key is bound as associated data, so ciphertext moved between deployments
/// with a different signing key fails authentication on read.
pub struct Aes256GcmCipher {
    cipher: Aes256Gcm,
    aad: Vec<u8>,
}

impl Aes256GcmCipher {
    pub fn new(encryption_key: &str, signing_key: &str) -> Self {
        let digest = Sha256::digest(encryption_key.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(&digest);
        Self {
            cipher: Aes256Gcm::new(key),
            aad: signing_key.as_bytes().to_vec(),
        }
    }
}

impl FieldCipher for Aes256GcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, Payload { msg: plaintext.as_bytes(), aad: &self.aad })
            .map_err(|_| CipherError::Encrypt)?;

        let mut wire = Vec::with_capacity(NONCE_LEN + sealed.len());
        wire.extend_from_slice(&nonce);
        wire.extend_from_slice(&sealed);
        Ok(BASE64.encode(wire))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let wire = BASE64
            .decode(ciphertext)
            .map_err(|e| CipherError::Encoding(e.to_string()))?;
        if wire.len() <= NONCE_LEN {
            return Err(CipherError::Decrypt);
        }

        let (nonce, sealed) = wire.split_at(NONCE_LEN);
        let opened = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), Payload { msg: sealed, aad: &self.aad })
            .map_err(|_| CipherError::Decrypt)?;

        String::from_utf8(opened).map_err(|_| CipherError::Decrypt)
    }
}

/// One-way digest of a plaintext name, used as the uniqueness lookup key
/// while the name itself stays encrypted at rest.
pub fn name_hash(name: &str) -> String {
    hex::encode(Sha256::digest(name.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> Aes256GcmCipher {
        Aes256GcmCipher::new("test-encryption-key", "test-signing-key")
    }

    #[test]
    fn round_trip() {
        let c = cipher();
        let sealed = c.encrypt("https://cdn.example.com/sermons/42.mp4").unwrap();
        assert_ne!(sealed, "https://cdn.example.com/sermons/42.mp4");
        assert_eq!(c.decrypt(&sealed).unwrap(), "https://cdn.example.com/sermons/42.mp4");
    }

    #[test]
    fn nonces_differ_between_encryptions() {
        let c = cipher();
        let a = c.encrypt("same plaintext").unwrap();
        let b = c.encrypt("same plaintext").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn signing_key_mismatch_fails_decryption() {
        let sealed = cipher().encrypt("secret").unwrap();
        let other = Aes256GcmCipher::new("test-encryption-key", "different-signing-key");
        assert!(matches!(other.decrypt(&sealed), Err(CipherError::Decrypt)));
    }

    #[test]
    fn garbage_input_is_rejected() {
        let c = cipher();
        assert!(matches!(c.decrypt("not base64 at all!!!"), Err(CipherError::Encoding(_))));
        assert!(matches!(c.decrypt("aGVsbG8="), Err(CipherError::Decrypt)));
    }

    #[test]
    fn name_hash_is_stable_and_hex() {
        let a = name_hash("Hillsong");
        let b = name_hash("Hillsong");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, name_hash("hillsong"));
    }
}
