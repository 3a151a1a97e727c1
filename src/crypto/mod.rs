//! Cryptographic primitives for PqVault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption with detached nonces (`encryption`)
//! - The master key container and SHA-256 envelope key derivation (`keys`)
//! - Master keyfile generation and loading (`keyfile`)
//! - `MasterKeyGuard`, which wraps ephemeral private keys (`guard`)
//! - The classical secp256k1 and post-quantum Kyber512 schemes
//!   (`classical`, `quantum`) behind one `Envelope` type (`envelope`)
//! - Declared key-type validation (`validate`)

pub mod classical;
pub mod encryption;
pub mod envelope;
pub mod guard;
pub mod keyfile;
pub mod keys;
pub mod quantum;
pub mod validate;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{Envelope, CryptoMode, MasterKeyGuard, ...};
pub use classical::Secp256k1Scheme;
pub use envelope::{ClassicalEnvelope, CryptoMode, Envelope, EnvelopeScheme, QuantumEnvelope};
pub use guard::{MasterKeyGuard, WrappedKey};
pub use keyfile::{generate_keyfile, load_keyfile};
pub use keys::MasterKey;
pub use quantum::Kyber512Scheme;
pub use validate::KeyType;
