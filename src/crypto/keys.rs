//! Master key container and envelope key derivation.
//!
//! Envelope schemes derive their AES-256 key by hashing secret material
//! (an ephemeral private key or a KEM shared secret) with SHA-256.  The
//! derived key is never stored; only the means to rebuild it is.

use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{Result, VaultError};

/// Length of the master key and of derived keys (256 bits).
pub const KEY_LEN: usize = 32;

/// Derive a 32-byte AES key from secret material with one SHA-256 pass.
///
/// The result zeroes itself when dropped.
pub fn derive_symmetric_key(material: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let digest = Sha256::digest(material);
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&digest);
    key
}

/// A wrapper around the 32-byte master key that automatically zeroes
/// its memory when dropped.
///
/// Loaded once at startup and handed to `MasterKeyGuard`; nothing
/// mutates it afterwards.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Build a master key from a byte slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            VaultError::Config(format!(
                "master key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::new(arr))
    }

    /// Parse a master key from 64 hex characters.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let mut raw = hex::decode(hex_str.trim())
            .map_err(|e| VaultError::Config(format!("master key is not valid hex: {e}")))?;
        let key = Self::from_slice(&raw);
        raw.zeroize();
        key.map_err(|_| {
            VaultError::Config(format!(
                "master key must be {KEY_LEN} bytes ({} hex characters)",
                KEY_LEN * 2
            ))
        })
    }

    /// Generate a fresh random master key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        let key = Self::new(bytes);
        bytes.zeroize();
        key
    }

    /// Hex form, as accepted by `from_hex`.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.bytes))
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}
