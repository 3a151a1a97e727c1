//! Classical envelope scheme: ephemeral secp256k1 identity + AES-256-GCM.
//!
//! The AES key is SHA-256 of the ephemeral private scalar.  There is no
//! key agreement with a recipient public key; confidentiality rests on
//! the wrapped private key alone.  The ephemeral public key is kept for
//! record completeness only.

use aes_gcm::aead::OsRng;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use zeroize::Zeroizing;

use super::encryption::{decrypt, encrypt};
use super::envelope::{ClassicalEnvelope, CryptoMode, EnvelopeScheme};
use super::guard::MasterKeyGuard;
use super::keys::derive_symmetric_key;
use crate::errors::{Result, VaultError};

/// secp256k1-based envelope scheme.
pub struct Secp256k1Scheme;

impl EnvelopeScheme for Secp256k1Scheme {
    type Envelope = ClassicalEnvelope;

    const MODE: CryptoMode = CryptoMode::Classical;

    fn seal(guard: &MasterKeyGuard, secret: &[u8]) -> Result<ClassicalEnvelope> {
        // 1. Fresh ephemeral keypair.
        let ephemeral = SecretKey::random(&mut OsRng);
        let priv_bytes = Zeroizing::new(ephemeral.to_bytes().to_vec());

        // 2. Derive the AES key from the private scalar and encrypt.
        let key = derive_symmetric_key(&priv_bytes);
        let sealed = encrypt(key.as_slice(), secret)?;

        // 3. Wrap the private key under the master key.
        let wrapped = guard.wrap(&priv_bytes)?;

        let ephemeral_pub_key = ephemeral
            .public_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();

        Ok(ClassicalEnvelope {
            ciphertext: sealed.ciphertext,
            nonce: sealed.nonce,
            ephemeral_pub_key,
            encrypted_ephemeral_priv_key: wrapped.ciphertext,
            ephemeral_priv_nonce: wrapped.nonce,
        })
    }

    fn open(guard: &MasterKeyGuard, envelope: &ClassicalEnvelope) -> Result<Zeroizing<Vec<u8>>> {
        let priv_bytes = guard.unwrap(
            &envelope.encrypted_ephemeral_priv_key,
            &envelope.ephemeral_priv_nonce,
        )?;

        // A scalar that does not parse means the record is corrupt.
        let ephemeral =
            SecretKey::from_slice(&priv_bytes).map_err(|_| VaultError::AuthenticationFailure)?;
        let scalar = Zeroizing::new(ephemeral.to_bytes().to_vec());

        let key = derive_symmetric_key(&scalar);
        decrypt(key.as_slice(), &envelope.ciphertext, &envelope.nonce).map(Zeroizing::new)
    }
}
