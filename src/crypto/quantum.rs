//! Post-quantum envelope scheme: ephemeral Kyber512 KEM + AES-256-GCM.
//!
//! A fresh KEM keypair is generated per seal and encapsulated against
//! itself.  The AES key is SHA-256 of the shared secret.  The KEM
//! private key is wrapped under the master key; the public key and the
//! encapsulation ciphertext are kept in clear.

use pqcrypto_kyber::kyber512;
use pqcrypto_traits::kem::{
    Ciphertext as _, PublicKey as _, SecretKey as _, SharedSecret as _,
};
use zeroize::Zeroizing;

use super::encryption::{decrypt, encrypt};
use super::envelope::{CryptoMode, EnvelopeScheme, QuantumEnvelope};
use super::guard::MasterKeyGuard;
use super::keys::derive_symmetric_key;
use crate::errors::{Result, VaultError};

/// Kyber512-based envelope scheme.
pub struct Kyber512Scheme;

impl EnvelopeScheme for Kyber512Scheme {
    type Envelope = QuantumEnvelope;

    const MODE: CryptoMode = CryptoMode::PostQuantum;

    fn seal(guard: &MasterKeyGuard, secret: &[u8]) -> Result<QuantumEnvelope> {
        // 1. Fresh KEM keypair.
        let (public_key, secret_key) = kyber512::keypair();

        // 2. Encapsulate against our own public key.
        let (shared, kem_ciphertext) = kyber512::encapsulate(&public_key);

        // 3. Derive the AES key from the shared secret and encrypt.
        let key = derive_symmetric_key(shared.as_bytes());
        let sealed = encrypt(key.as_slice(), secret)?;

        // 4. Wrap the KEM private key under the master key.
        let wrapped = guard.wrap(secret_key.as_bytes())?;

        Ok(QuantumEnvelope {
            ciphertext: sealed.ciphertext,
            nonce: sealed.nonce,
            kyber_pub_key: public_key.as_bytes().to_vec(),
            kyber_ciphertext: kem_ciphertext.as_bytes().to_vec(),
            encrypted_kyber_priv_key: wrapped.ciphertext,
            kyber_priv_nonce: wrapped.nonce,
        })
    }

    fn open(guard: &MasterKeyGuard, envelope: &QuantumEnvelope) -> Result<Zeroizing<Vec<u8>>> {
        let priv_bytes = guard.unwrap(
            &envelope.encrypted_kyber_priv_key,
            &envelope.kyber_priv_nonce,
        )?;

        let secret_key = kyber512::SecretKey::from_bytes(&priv_bytes)
            .map_err(|_| VaultError::AuthenticationFailure)?;
        let kem_ciphertext = kyber512::Ciphertext::from_bytes(&envelope.kyber_ciphertext)
            .map_err(|_| VaultError::AuthenticationFailure)?;

        // Kyber decapsulation never errors: a tampered ciphertext yields an
        // unrelated shared secret, which the AEAD tag check then rejects.
        let shared = kyber512::decapsulate(&kem_ciphertext, &secret_key);

        let key = derive_symmetric_key(shared.as_bytes());
        decrypt(key.as_slice(), &envelope.ciphertext, &envelope.nonce).map(Zeroizing::new)
    }
}

/// Public key length of each supported Kyber parameter set.
pub fn kyber_public_key_len(level: u16) -> Option<usize> {
    match level {
        512 => Some(kyber512::public_key_bytes()),
        768 => Some(pqcrypto_kyber::kyber768::public_key_bytes()),
        1024 => Some(pqcrypto_kyber::kyber1024::public_key_bytes()),
        _ => None,
    }
}
