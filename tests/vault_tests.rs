//! Integration tests for the PqVault store and service.

use pqvault::crypto::{CryptoMode, MasterKey, MasterKeyGuard};
use pqvault::errors::VaultError;
use pqvault::vault::format::encode_entry;
use pqvault::vault::{KeyEncoding, NewKey, VaultEntry, VaultService, VaultStore};
use tempfile::TempDir;

const CLASSICAL_FIELDS: [&str; 3] = [
    "ephemeral_pub_key",
    "encrypted_ephemeral_priv_key",
    "ephemeral_priv_nonce",
];
const QUANTUM_FIELDS: [&str; 4] = [
    "kyber_pub_key",
    "kyber_ciphertext",
    "encrypted_kyber_priv_key",
    "kyber_priv_nonce",
];

/// Helper: a fresh database path inside a temp dir.
fn db_path() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("vault.db");
    (dir, path)
}

fn guard() -> MasterKeyGuard {
    MasterKeyGuard::new(MasterKey::new([0x11u8; 32]))
}

fn new_key(secret: &[u8]) -> NewKey<'_> {
    NewKey {
        user_id: "alice",
        label: "wallet",
        key_type: "opaque",
        key_encoding: "hex",
        secret,
    }
}

/// Top-level JSON field names of a stored record.
fn record_fields(entry: &VaultEntry) -> Vec<String> {
    let json: serde_json::Value = serde_json::from_slice(&encode_entry(entry).unwrap()).unwrap();
    json.as_object().unwrap().keys().cloned().collect()
}

fn assert_field_hygiene(entry: &VaultEntry) {
    let fields = record_fields(entry);
    let (present, absent): (&[&str], &[&str]) = match entry.crypto_mode() {
        CryptoMode::Classical => (&CLASSICAL_FIELDS[..], &QUANTUM_FIELDS[..]),
        CryptoMode::PostQuantum => (&QUANTUM_FIELDS[..], &CLASSICAL_FIELDS[..]),
    };
    for f in present {
        assert!(fields.iter().any(|x| x == f), "missing {f}");
    }
    for f in absent {
        assert!(!fields.iter().any(|x| x == f), "unexpected {f}");
    }
}

// ---------------------------------------------------------------------------
// Store basics
// ---------------------------------------------------------------------------

#[test]
fn new_store_defaults_to_classical() {
    let (_dir, path) = db_path();
    let store = VaultStore::open(&path).unwrap();
    assert_eq!(store.get_mode().unwrap(), CryptoMode::Classical);
    assert!(store.is_empty().unwrap());
}

#[test]
fn mode_and_entries_survive_reopen() {
    let (_dir, path) = db_path();
    let id = {
        let mut svc = VaultService::new(VaultStore::open(&path).unwrap(), guard());
        svc.store_mut().set_mode(CryptoMode::PostQuantum).unwrap();
        svc.store_key(new_key(b"persisted")).unwrap().id
    };

    let svc = VaultService::new(VaultStore::open(&path).unwrap(), guard());
    assert_eq!(svc.mode().unwrap(), CryptoMode::PostQuantum);
    let (entry, secret) = svc.retrieve(&id).unwrap();
    assert_eq!(entry.crypto_mode(), CryptoMode::PostQuantum);
    assert_eq!(secret.as_slice(), b"persisted");
}

#[test]
fn get_unknown_id_is_not_found() {
    let store = VaultStore::open_in_memory().unwrap();
    assert!(matches!(store.get("nope"), Err(VaultError::NotFound(_))));
}

#[test]
fn set_mode_rejects_unknown_string() {
    let mut store = VaultStore::open_in_memory().unwrap();
    assert!(matches!(
        store.set_mode_str("rot13"),
        Err(VaultError::InvalidMode(_))
    ));
    assert_eq!(store.get_mode().unwrap(), CryptoMode::Classical);
}

#[cfg(unix)]
#[test]
fn database_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, path) = db_path();
    VaultStore::open(&path).unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

// ---------------------------------------------------------------------------
// Service: store, retrieve, rotate
// ---------------------------------------------------------------------------

#[test]
fn store_and_retrieve_in_each_mode() {
    let mut svc = VaultService::new(VaultStore::open_in_memory().unwrap(), guard());

    for mode in CryptoMode::ALL {
        svc.store_mut().set_mode(mode).unwrap();
        let entry = svc.store_key(new_key(b"material")).unwrap();
        assert_eq!(entry.crypto_mode(), mode);
        assert_field_hygiene(&entry);

        let (loaded, secret) = svc.retrieve(&entry.id).unwrap();
        assert_eq!(loaded, entry);
        assert_eq!(secret.as_slice(), b"material");
    }
}

#[test]
fn retrieve_with_wrong_master_key_fails() {
    let (_dir, path) = db_path();
    let mut svc = VaultService::new(VaultStore::open(&path).unwrap(), guard());
    let id = svc.store_key(new_key(b"x")).unwrap().id;
    drop(svc);

    let wrong = MasterKeyGuard::new(MasterKey::new([0x22u8; 32]));
    let svc = VaultService::new(VaultStore::open(&path).unwrap(), wrong);
    assert!(matches!(
        svc.retrieve(&id),
        Err(VaultError::AuthenticationFailure)
    ));
}

#[test]
fn rotate_moves_entry_into_current_mode() {
    let mut svc = VaultService::new(VaultStore::open_in_memory().unwrap(), guard());
    let entry = svc.store_key(new_key(b"v1")).unwrap();
    assert_eq!(entry.crypto_mode(), CryptoMode::Classical);

    svc.store_mut().set_mode(CryptoMode::PostQuantum).unwrap();
    let rotated = svc.rotate_key(&entry.id, "opaque", "hex", b"v2").unwrap();

    assert_eq!(rotated.crypto_mode(), CryptoMode::PostQuantum);
    assert_field_hygiene(&rotated);
    assert_eq!(svc.retrieve(&entry.id).unwrap().1.as_slice(), b"v2");
}

#[test]
fn secp256k1_key_type_is_validated() {
    let mut svc = VaultService::new(VaultStore::open_in_memory().unwrap(), guard());

    let generator = KeyEncoding::Hex
        .decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
        .unwrap();
    let mut ok = new_key(&generator);
    ok.key_type = "secp256k1";
    assert!(svc.store_key(ok).is_ok());

    let mut bad = new_key(&[0xde, 0xad, 0xbe, 0xef]);
    bad.key_type = "secp256k1";
    assert!(matches!(svc.store_key(bad), Err(VaultError::Validation(_))));
    assert_eq!(svc.store().len().unwrap(), 1);
}

#[test]
fn deadbeef_roundtrips_through_hex_encoding() {
    let mut svc = VaultService::new(VaultStore::open_in_memory().unwrap(), guard());

    let secret = KeyEncoding::Hex.decode("0xdeadbeef").unwrap();
    let entry = svc.store_key(new_key(&secret)).unwrap();

    let (loaded, plain) = svc.retrieve(&entry.id).unwrap();
    assert_eq!(plain.as_slice(), &[0xde, 0xad, 0xbe, 0xef]);
    let encoding: KeyEncoding = loaded.key_encoding.parse().unwrap();
    assert_eq!(encoding.encode(&plain).unwrap().as_str(), "deadbeef");
}
