//! Record format for persisted vault entries.
//!
//! Each entry is stored as one self-describing JSON object.  The shared
//! metadata sits next to the envelope fields, and `crypto_mode` decides
//! which envelope fields are present:
//!
//! ```text
//! {"id": "...", "user_id": "...", "label": "...", "key_type": "...",
//!  "key_encoding": "...", "created_at": "...", "updated_at": "...",
//!  "crypto_mode": "classical" | "quantum-safe",
//!  "ciphertext": "<b64>", "nonce": "<b64>", ...scheme fields (base64)...}
//! ```
//!
//! Byte fields are base64 strings.  The store never looks inside them.

use serde::Deserialize;

use super::entry::VaultEntry;
use crate::errors::{Result, VaultError};

/// Serialize an entry into its stored record bytes.
pub fn encode_entry(entry: &VaultEntry) -> Result<Vec<u8>> {
    serde_json::to_vec(entry)
        .map_err(|e| VaultError::Serialization(format!("entry '{}': {e}", entry.id)))
}

/// Parse stored record bytes back into an entry.
pub fn decode_entry(bytes: &[u8]) -> Result<VaultEntry> {
    serde_json::from_slice(bytes).map_err(|e| VaultError::Serialization(format!("entry: {e}")))
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
