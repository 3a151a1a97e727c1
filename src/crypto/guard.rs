//! MasterKeyGuard: wraps and unwraps short-lived private key material
//! under the process master key.
//!
//! The guard is constructed with an explicit `MasterKey` so tests (and
//! multiple vaults in one process) can each carry their own key.

use zeroize::Zeroizing;

use super::encryption::{decrypt, encrypt};
use super::keys::MasterKey;
use crate::errors::Result;

/// Private key material wrapped by the master key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// Holds the master key for the lifetime of the process.
pub struct MasterKeyGuard {
    key: MasterKey,
}

impl MasterKeyGuard {
    pub fn new(key: MasterKey) -> Self {
        Self { key }
    }

    /// Encrypt `plaintext` under the master key with a fresh nonce.
    pub fn wrap(&self, plaintext: &[u8]) -> Result<WrappedKey> {
        let sealed = encrypt(self.key.as_bytes(), plaintext)?;
        Ok(WrappedKey {
            ciphertext: sealed.ciphertext,
            nonce: sealed.nonce,
        })
    }

    /// Decrypt wrapped key material.
    ///
    /// Fails with `AuthenticationFailure` if the ciphertext, nonce or
    /// master key do not match.
    pub fn unwrap(&self, ciphertext: &[u8], nonce: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        decrypt(self.key.as_bytes(), ciphertext, nonce).map(Zeroizing::new)
    }
}

impl std::fmt::Debug for MasterKeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKeyGuard").finish_non_exhaustive()
    }
}
