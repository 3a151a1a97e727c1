//! Declared key-type validation for stored key material.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::quantum::kyber_public_key_len;
use crate::errors::{Result, VaultError};

/// Length of an Ed25519 public key.
const ED25519_KEY_LEN: usize = 32;

/// The key types a caller may declare when storing key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// Any non-empty byte string (symmetric keys, seeds, tokens).
    Opaque,
    Secp256k1,
    Ed25519,
    Kyber512,
    Kyber768,
    Kyber1024,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Opaque => "opaque",
            KeyType::Secp256k1 => "secp256k1",
            KeyType::Ed25519 => "ed25519",
            KeyType::Kyber512 => "kyber512",
            KeyType::Kyber768 => "kyber768",
            KeyType::Kyber1024 => "kyber1024",
        }
    }

    /// Check that `data` is well-formed for this key type.
    pub fn validate(&self, data: &[u8]) -> Result<()> {
        match self {
            KeyType::Opaque if data.is_empty() => {
                Err(VaultError::Validation("key material cannot be empty".into()))
            }
            KeyType::Opaque => Ok(()),
            KeyType::Secp256k1 => k256::PublicKey::from_sec1_bytes(data)
                .map(|_| ())
                .map_err(|_| VaultError::Validation("invalid secp256k1 public key".into())),
            KeyType::Ed25519 => expect_len(data, ED25519_KEY_LEN, "ed25519"),
            KeyType::Kyber512 => expect_kyber(data, 512),
            KeyType::Kyber768 => expect_kyber(data, 768),
            KeyType::Kyber1024 => expect_kyber(data, 1024),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "opaque" => Ok(KeyType::Opaque),
            "secp256k1" => Ok(KeyType::Secp256k1),
            "ed25519" => Ok(KeyType::Ed25519),
            "kyber512" => Ok(KeyType::Kyber512),
            "kyber768" => Ok(KeyType::Kyber768),
            "kyber1024" => Ok(KeyType::Kyber1024),
            other => Err(VaultError::Validation(format!(
                "unsupported key type '{other}'"
            ))),
        }
    }
}

fn expect_len(data: &[u8], expected: usize, name: &str) -> Result<()> {
    if data.len() == expected {
        Ok(())
    } else {
        Err(VaultError::Validation(format!(
            "invalid {name} key length: expected {expected} bytes, got {}",
            data.len()
        )))
    }
}

fn expect_kyber(data: &[u8], level: u16) -> Result<()> {
    let expected = kyber_public_key_len(level)
        .ok_or_else(|| VaultError::Validation(format!("unsupported Kyber level {level}")))?;
    expect_len(data, expected, &format!("kyber{level}"))
}
