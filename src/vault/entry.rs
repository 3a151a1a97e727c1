//! VaultEntry and KeyEncoding types.
//!
//! An entry holds descriptive metadata plus exactly one `Envelope`.
//! The metadata is opaque to the crypto layer; the envelope's tag is
//! the entry's own `crypto_mode`, which may differ from the global mode
//! while a migration is in flight or after one failed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::{CryptoMode, Envelope};
use crate::errors::{Result, VaultError};

/// A single stored, encrypted key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    /// Unique identifier, assigned at creation and used as the store key.
    pub id: String,

    pub user_id: String,

    pub label: String,

    /// Declared key type (e.g. "secp256k1", "kyber512").
    pub key_type: String,

    /// How the caller encodes the key on input and output ("hex", "string").
    pub key_encoding: String,

    pub created_at: DateTime<Utc>,

    /// Last rotation or migration. Absent on records never rewritten.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// The sealed key and the scheme it is sealed under.
    #[serde(flatten)]
    pub envelope: Envelope,
}

impl VaultEntry {
    /// The scheme this entry is currently encrypted under.
    pub fn crypto_mode(&self) -> CryptoMode {
        self.envelope.mode()
    }

    /// Metadata view without any ciphertext.
    pub fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            label: self.label.clone(),
            key_type: self.key_type.clone(),
            crypto_mode: self.crypto_mode(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Lightweight metadata about an entry (no envelope).
///
/// Returned by `VaultService::list` so callers can display entries
/// without touching any ciphertext.
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    pub id: String,
    pub user_id: String,
    pub label: String,
    pub key_type: String,
    pub crypto_mode: CryptoMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Transport encoding of key material, recorded per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    Hex,
    String,
}

impl KeyEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyEncoding::Hex => "hex",
            KeyEncoding::String => "string",
        }
    }

    /// Decode caller input into raw key bytes.
    ///
    /// Hex input may carry a `0x` prefix.
    pub fn decode(&self, input: &str) -> Result<Zeroizing<Vec<u8>>> {
        match self {
            KeyEncoding::Hex => {
                let trimmed = input.trim();
                let digits = trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                    .unwrap_or(trimmed);
                hex::decode(digits)
                    .map(Zeroizing::new)
                    .map_err(|e| VaultError::Validation(format!("invalid hex key: {e}")))
            }
            KeyEncoding::String => Ok(Zeroizing::new(input.as_bytes().to_vec())),
        }
    }

    /// Encode raw key bytes for output.
    pub fn encode(&self, bytes: &[u8]) -> Result<Zeroizing<String>> {
        match self {
            KeyEncoding::Hex => Ok(Zeroizing::new(hex::encode(bytes))),
            KeyEncoding::String => std::str::from_utf8(bytes)
                .map(|s| Zeroizing::new(s.to_string()))
                .map_err(|_| {
                    VaultError::Serialization("stored key is not valid UTF-8".to_string())
                }),
        }
    }
}

impl fmt::Display for KeyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyEncoding {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hex" => Ok(KeyEncoding::Hex),
            "string" => Ok(KeyEncoding::String),
            other => Err(VaultError::Validation(format!(
                "unsupported key encoding '{other}', use 'hex' or 'string'"
            ))),
        }
    }
}
