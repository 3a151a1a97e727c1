//! AES-256-GCM authenticated encryption with a detached nonce.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! returns it next to the ciphertext.  Callers never supply a nonce for
//! encryption, so a nonce can never be reused under the same key.
//!
//! Vault records keep the nonce in its own field, which is why the
//! nonce is not prepended to the ciphertext here.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use crate::errors::{Result, VaultError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Output of one `encrypt` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Ciphertext with the 16-byte auth tag appended.
    pub ciphertext: Vec<u8>,
    /// The 12-byte nonce used for this ciphertext.
    pub nonce: Vec<u8>,
}

/// Encrypt `plaintext` with a 32-byte `key` under a fresh random nonce.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Sealed> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    Ok(Sealed {
        ciphertext,
        nonce: nonce.to_vec(),
    })
}

/// Decrypt and verify a ciphertext produced by `encrypt`.
///
/// Every failure (bad key length, bad nonce length, tag mismatch) maps
/// to `AuthenticationFailure`.
pub fn decrypt(key: &[u8], ciphertext: &[u8], nonce: &[u8]) -> Result<Vec<u8>> {
    // `Nonce::from_slice` panics on a wrong length, so check first.
    if nonce.len() != NONCE_LEN {
        return Err(VaultError::AuthenticationFailure);
    }
    let nonce = Nonce::from_slice(nonce);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::AuthenticationFailure)?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::AuthenticationFailure)
}
