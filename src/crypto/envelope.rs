//! Envelope encryption shared by both crypto modes.
//!
//! An envelope is the ciphertext of a caller secret plus everything
//! needed to rebuild its key: a wrapped private key and, for the
//! post-quantum scheme, the KEM ciphertext.  The symmetric key itself
//! is never stored.
//!
//! `Envelope` is a tagged union, so an entry can only ever carry the
//! fields of the scheme it is encrypted under.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::classical::Secp256k1Scheme;
use super::guard::MasterKeyGuard;
use super::quantum::Kyber512Scheme;
use crate::errors::{Result, VaultError};
use crate::vault::format::{base64_decode, base64_encode};

// ---------------------------------------------------------------------------
// CryptoMode
// ---------------------------------------------------------------------------

/// The scheme governing new encryptions (and recorded per entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CryptoMode {
    #[default]
    #[serde(rename = "classical")]
    Classical,
    #[serde(rename = "quantum-safe")]
    PostQuantum,
}

impl CryptoMode {
    /// Every valid mode, in display order.
    pub const ALL: [CryptoMode; 2] = [CryptoMode::Classical, CryptoMode::PostQuantum];

    /// The persisted string form of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            CryptoMode::Classical => "classical",
            CryptoMode::PostQuantum => "quantum-safe",
        }
    }
}

impl fmt::Display for CryptoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CryptoMode {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "classical" => Ok(CryptoMode::Classical),
            "quantum-safe" => Ok(CryptoMode::PostQuantum),
            other => Err(VaultError::InvalidMode(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Scheme trait
// ---------------------------------------------------------------------------

/// One envelope-encryption scheme.
///
/// `seal` encrypts a secret under a fresh ephemeral asymmetric identity
/// and wraps that identity's private key with the guard; `open` is the
/// inverse and fails with `AuthenticationFailure` on any mismatch.
pub trait EnvelopeScheme {
    /// The scheme-specific record produced by `seal`.
    type Envelope;

    /// The mode tag recorded for envelopes of this scheme.
    const MODE: CryptoMode;

    fn seal(guard: &MasterKeyGuard, secret: &[u8]) -> Result<Self::Envelope>;

    fn open(guard: &MasterKeyGuard, envelope: &Self::Envelope) -> Result<Zeroizing<Vec<u8>>>;
}

// ---------------------------------------------------------------------------
// Scheme records
// ---------------------------------------------------------------------------

/// Classical (secp256k1) envelope fields.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicalEnvelope {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub nonce: Vec<u8>,
    /// Compressed SEC1 public key of the ephemeral identity, kept in clear.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ephemeral_pub_key: Vec<u8>,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub encrypted_ephemeral_priv_key: Vec<u8>,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ephemeral_priv_nonce: Vec<u8>,
}

/// Post-quantum (Kyber512) envelope fields.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantumEnvelope {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub nonce: Vec<u8>,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub kyber_pub_key: Vec<u8>,
    /// Encapsulation output, kept in clear.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub kyber_ciphertext: Vec<u8>,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub encrypted_kyber_priv_key: Vec<u8>,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub kyber_priv_nonce: Vec<u8>,
}

// Byte fields are summarised, not dumped, in debug output.
impl fmt::Debug for ClassicalEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassicalEnvelope")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("ephemeral_pub_key", &hex::encode(&self.ephemeral_pub_key))
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for QuantumEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuantumEnvelope")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("kyber_ciphertext_len", &self.kyber_ciphertext.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A sealed secret under exactly one scheme, tagged by `crypto_mode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "crypto_mode")]
pub enum Envelope {
    #[serde(rename = "classical")]
    Classical(ClassicalEnvelope),
    #[serde(rename = "quantum-safe")]
    PostQuantum(QuantumEnvelope),
}

impl Envelope {
    /// Seal `secret` under the scheme selected by `mode`.
    pub fn seal(guard: &MasterKeyGuard, mode: CryptoMode, secret: &[u8]) -> Result<Self> {
        match mode {
            CryptoMode::Classical => Secp256k1Scheme::seal(guard, secret).map(Envelope::Classical),
            CryptoMode::PostQuantum => {
                Kyber512Scheme::seal(guard, secret).map(Envelope::PostQuantum)
            }
        }
    }

    /// Open this envelope with the scheme it was sealed under.
    pub fn open(&self, guard: &MasterKeyGuard) -> Result<Zeroizing<Vec<u8>>> {
        match self {
            Envelope::Classical(env) => Secp256k1Scheme::open(guard, env),
            Envelope::PostQuantum(env) => Kyber512Scheme::open(guard, env),
        }
    }

    /// The scheme this envelope is encrypted under.
    pub fn mode(&self) -> CryptoMode {
        match self {
            Envelope::Classical(_) => Secp256k1Scheme::MODE,
            Envelope::PostQuantum(_) => Kyber512Scheme::MODE,
        }
    }

    /// Classical fields, if this envelope is classical.
    pub fn classical(&self) -> Option<&ClassicalEnvelope> {
        match self {
            Envelope::Classical(env) => Some(env),
            Envelope::PostQuantum(_) => None,
        }
    }

    /// Post-quantum fields, if this envelope is post-quantum.
    pub fn post_quantum(&self) -> Option<&QuantumEnvelope> {
        match self {
            Envelope::PostQuantum(env) => Some(env),
            Envelope::Classical(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::MasterKey;

    fn guard() -> MasterKeyGuard {
        MasterKeyGuard::new(MasterKey::new([0x5Au8; 32]))
    }

    #[test]
    fn mode_parses_persisted_strings() {
        assert_eq!(
            "classical".parse::<CryptoMode>().unwrap(),
            CryptoMode::Classical
        );
        assert_eq!(
            "quantum-safe".parse::<CryptoMode>().unwrap(),
            CryptoMode::PostQuantum
        );
    }

    #[test]
    fn mode_rejects_unknown_strings() {
        let err = "kyber".parse::<CryptoMode>().unwrap_err();
        assert!(matches!(err, VaultError::InvalidMode(ref m) if m == "kyber"));
    }

    #[test]
    fn default_mode_is_classical() {
        assert_eq!(CryptoMode::default(), CryptoMode::Classical);
    }

    #[test]
    fn seal_dispatches_on_mode() {
        let g = guard();
        for mode in CryptoMode::ALL {
            let env = Envelope::seal(&g, mode, b"secret").unwrap();
            assert_eq!(env.mode(), mode);
            assert_eq!(env.open(&g).unwrap().as_slice(), b"secret");
        }
    }

    #[test]
    fn envelope_only_exposes_its_own_scheme() {
        let g = guard();
        let classical = Envelope::seal(&g, CryptoMode::Classical, b"s").unwrap();
        assert!(classical.classical().is_some());
        assert!(classical.post_quantum().is_none());

        let pq = Envelope::seal(&g, CryptoMode::PostQuantum, b"s").unwrap();
        assert!(pq.post_quantum().is_some());
        assert!(pq.classical().is_none());
    }

    #[test]
    fn serialized_envelope_carries_mode_tag_and_no_foreign_fields() {
        let g = guard();
        let env = Envelope::seal(&g, CryptoMode::PostQuantum, b"s").unwrap();
        let json = serde_json::to_value(&env).unwrap();

        assert_eq!(json["crypto_mode"], "quantum-safe");
        assert!(json.get("kyber_ciphertext").is_some());
        assert!(json.get("ephemeral_pub_key").is_none());
        assert!(json.get("encrypted_ephemeral_priv_key").is_none());

        let back: Envelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, env);
    }
}
