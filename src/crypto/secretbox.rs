//! Envelope sealing: AES-256-GCM under a passphrase-derived key.
//!
//! Wire format: `nonce (12 bytes) || ciphertext + tag`.
//!
//! The key is SHA-256 of the passphrase with no per-user salt, so identical
//! passphrases across users derive identical keys. This is a documented
//! weakness of the wire format, kept for compatibility with existing vaults.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use aes_gcm::aead::rand_core::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{AppError, Result};

/// The size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// The size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// The size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// A secure key wrapper that ensures the key is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecureKey([u8; KEY_SIZE]);

impl SecureKey {
    /// Creates a new `SecureKey` from a byte array.
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self(key)
    }

    /// Returns a reference to the key as a byte slice.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Derives the AES-256 key from a passphrase.
pub fn derive_key(passphrase: &str) -> SecureKey {
    let digest = Sha256::digest(passphrase.as_bytes());
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&digest);
    SecureKey::new(key)
}

/// Seals a plaintext with a passphrase-derived key, prepending a fresh
/// random nonce.
pub fn seal(passphrase: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = derive_key(passphrase);
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from(nonce_bytes);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| AppError::Encryption(format!("Encryption failed: {}", e)))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Opens sealed bytes (`nonce || ciphertext + tag`).
///
/// Fails when the passphrase is wrong or the ciphertext was tampered with.
/// Never returns unauthenticated plaintext.
pub fn open(passphrase: &str, data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < NONCE_SIZE + TAG_SIZE {
        return Err(AppError::Encryption("Ciphertext too short".to_string()));
    }
    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);

    let key = derive_key(passphrase);
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher.decrypt(nonce, ciphertext).map_err(|_| {
        AppError::Encryption("Decryption failed: wrong passphrase or corrupted data".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_round_trip() {
        let sealed = seal("passphrase", b"the quick brown fox").unwrap();
        let opened = open("passphrase", &sealed).unwrap();
        assert_eq!(opened, b"the quick brown fox");
    }

    #[test]
    fn nonce_is_fresh_per_call() {
        let a = seal("p", b"same plaintext").unwrap();
        let b = seal("p", b"same plaintext").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_passphrase_fails() {
        let sealed = seal("right", b"secret").unwrap();
        let err = open("wrong", &sealed).unwrap_err();
        assert!(matches!(err, AppError::Encryption(_)));
    }

    #[test]
    fn any_flipped_bit_is_detected() {
        let sealed = seal("p", b"payload under test").unwrap();
        for i in 0..sealed.len() {
            let mut corrupted = sealed.clone();
            corrupted[i] ^= 0x01;
            assert!(
                open("p", &corrupted).is_err(),
                "bit flip at byte {} went undetected",
                i
            );
        }
    }

    #[test]
    fn truncated_input_fails() {
        let sealed = seal("p", b"x").unwrap();
        assert!(open("p", &sealed[..NONCE_SIZE]).is_err());
        assert!(open("p", &[]).is_err());
    }
}
