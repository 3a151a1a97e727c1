//! Integration tests for crypto mode migration.

use chrono::Utc;
use pqvault::crypto::{CryptoMode, Envelope, MasterKey, MasterKeyGuard};
use pqvault::errors::VaultError;
use pqvault::vault::format::encode_entry;
use pqvault::vault::{
    KeyEncoding, MigrationPolicy, ModeMigrator, NewKey, VaultEntry, VaultService, VaultStore,
};
use tempfile::TempDir;

fn guard() -> MasterKeyGuard {
    MasterKeyGuard::new(MasterKey::new([0x33u8; 32]))
}

fn service() -> VaultService {
    VaultService::new(VaultStore::open_in_memory().unwrap(), guard())
}

/// Store `n` opaque keys ("key-0", "key-1", ...) and return their ids.
fn fill(svc: &mut VaultService, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let secret = format!("key-{i}");
            svc.store_key(NewKey {
                user_id: "u",
                label: &secret,
                key_type: "opaque",
                key_encoding: "string",
                secret: secret.as_bytes(),
            })
            .unwrap()
            .id
        })
        .collect()
}

/// Corrupt the wrapped private key of one entry, whatever its mode.
fn tamper(store: &mut VaultStore, id: &str) {
    let mut entry = store.get(id).unwrap();
    match &mut entry.envelope {
        Envelope::Classical(env) => env.encrypted_ephemeral_priv_key[0] ^= 0x01,
        Envelope::PostQuantum(env) => env.encrypted_kyber_priv_key[0] ^= 0x01,
    }
    store.put(&entry).unwrap();
}

/// Overwrite the stored record of one entry with bytes that do not decode.
fn corrupt_record(path: &std::path::Path, id: &str) {
    let conn = rusqlite::Connection::open(path).unwrap();
    let changed = conn
        .execute(
            "UPDATE vault SET record = ?1 WHERE id = ?2",
            rusqlite::params![b"{garbage".to_vec(), id],
        )
        .unwrap();
    assert_eq!(changed, 1);
}

fn records(store: &VaultStore) -> Vec<Vec<u8>> {
    store
        .entries()
        .unwrap()
        .iter()
        .map(|e| encode_entry(e).unwrap())
        .collect()
}

fn assert_all_readable(svc: &VaultService, ids: &[String]) {
    for (i, id) in ids.iter().enumerate() {
        let (_, secret) = svc.retrieve(id).unwrap();
        assert_eq!(secret.as_slice(), format!("key-{i}").as_bytes());
    }
}

// ---------------------------------------------------------------------------
// Successful migrations
// ---------------------------------------------------------------------------

#[test]
fn migrate_classical_to_quantum_and_back() {
    let mut svc = service();
    let ids = fill(&mut svc, 5);

    let report = svc.set_mode(CryptoMode::PostQuantum).unwrap();
    assert_eq!(report.from, CryptoMode::Classical);
    assert_eq!(report.to, CryptoMode::PostQuantum);
    assert_eq!(report.rewritten, 5);
    assert_eq!(svc.mode().unwrap(), CryptoMode::PostQuantum);
    assert_eq!(svc.census().unwrap().post_quantum, 5);
    for id in &ids {
        let entry = svc.store().get(id).unwrap();
        assert!(entry.envelope.classical().is_none());
        assert!(entry.updated_at.is_some());
    }
    assert_all_readable(&svc, &ids);

    svc.set_mode(CryptoMode::Classical).unwrap();
    assert_eq!(svc.mode().unwrap(), CryptoMode::Classical);
    assert_eq!(svc.census().unwrap().classical, 5);
    for id in &ids {
        assert!(svc.store().get(id).unwrap().envelope.post_quantum().is_none());
    }
    assert_all_readable(&svc, &ids);
}

#[test]
fn migrate_empty_store_flips_flag() {
    let mut svc = service();
    let report = svc.set_mode(CryptoMode::PostQuantum).unwrap();
    assert_eq!(report.rewritten, 0);
    assert!(!report.is_noop());
    assert_eq!(svc.mode().unwrap(), CryptoMode::PostQuantum);
}

#[test]
fn migrate_to_current_mode_changes_nothing() {
    let mut svc = service();
    fill(&mut svc, 3);
    let before = records(svc.store());

    let report = svc.set_mode(CryptoMode::Classical).unwrap();

    assert!(report.is_noop());
    assert_eq!(records(svc.store()), before);
}

#[test]
fn atomic_policy_migrates_everything() {
    let mut svc = service().with_policy(MigrationPolicy::Atomic);
    let ids = fill(&mut svc, 3);

    let report = svc.set_mode(CryptoMode::PostQuantum).unwrap();
    assert_eq!(report.rewritten, 3);
    assert_eq!(svc.mode().unwrap(), CryptoMode::PostQuantum);
    assert_all_readable(&svc, &ids);
}

// ---------------------------------------------------------------------------
// Failures mid-pass
// ---------------------------------------------------------------------------

#[test]
fn per_entry_failure_stops_at_bad_entry() {
    let mut svc = service();
    let ids = fill(&mut svc, 5);
    tamper(svc.store_mut(), &ids[2]);

    let err = svc.set_mode(CryptoMode::PostQuantum).unwrap_err();
    match err {
        VaultError::MigrationPartialFailure {
            ref id,
            rewritten,
            ref source,
        } => {
            assert_eq!(id, &ids[2]);
            assert_eq!(rewritten, 2);
            assert!(matches!(**source, VaultError::AuthenticationFailure));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Flag untouched; entries before the bad one moved, the rest did not.
    assert_eq!(svc.mode().unwrap(), CryptoMode::Classical);
    let modes: Vec<CryptoMode> = ids
        .iter()
        .map(|id| svc.store().get(id).unwrap().crypto_mode())
        .collect();
    assert_eq!(
        modes,
        vec![
            CryptoMode::PostQuantum,
            CryptoMode::PostQuantum,
            CryptoMode::Classical,
            CryptoMode::Classical,
            CryptoMode::Classical,
        ]
    );
    assert!(svc.census().unwrap().is_mixed());

    // Every good entry stays readable with its own scheme.
    for (i, id) in ids.iter().enumerate().filter(|(i, _)| *i != 2) {
        let (_, secret) = svc.retrieve(id).unwrap();
        assert_eq!(secret.as_slice(), format!("key-{i}").as_bytes());
    }
}

#[test]
fn per_entry_failure_stops_going_back_to_classical() {
    let mut svc = service();
    svc.store_mut().set_mode(CryptoMode::PostQuantum).unwrap();
    let ids = fill(&mut svc, 4);
    tamper(svc.store_mut(), &ids[2]);

    let err = svc.set_mode(CryptoMode::Classical).unwrap_err();
    match err {
        VaultError::MigrationPartialFailure {
            ref id,
            rewritten,
            ref source,
        } => {
            assert_eq!(id, &ids[2]);
            assert_eq!(rewritten, 2);
            assert!(matches!(**source, VaultError::AuthenticationFailure));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(svc.mode().unwrap(), CryptoMode::PostQuantum);
    let census = svc.census().unwrap();
    assert_eq!(census.classical, 2);
    assert_eq!(census.post_quantum, 2);
    assert!(svc.store().get(&ids[2]).unwrap().envelope.post_quantum().is_some());
    assert_eq!(svc.retrieve(&ids[3]).unwrap().1.as_slice(), b"key-3");
}

#[test]
fn undecodable_record_is_a_partial_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.db");
    let mut svc = VaultService::new(VaultStore::open(&path).unwrap(), guard());
    let ids = fill(&mut svc, 3);
    corrupt_record(&path, &ids[1]);

    let err = svc.set_mode(CryptoMode::PostQuantum).unwrap_err();
    match err {
        VaultError::MigrationPartialFailure {
            ref id,
            rewritten,
            ref source,
        } => {
            assert_eq!(id, &ids[1]);
            assert_eq!(rewritten, 1);
            assert!(matches!(**source, VaultError::Serialization(_)));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(svc.mode().unwrap(), CryptoMode::Classical);
    let first = svc.store().get(&ids[0]).unwrap();
    assert_eq!(first.crypto_mode(), CryptoMode::PostQuantum);
    let last = svc.store().get(&ids[2]).unwrap();
    assert_eq!(last.crypto_mode(), CryptoMode::Classical);
}

#[test]
fn repair_reports_undecodable_record_as_partial_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.db");
    let mut svc = VaultService::new(VaultStore::open(&path).unwrap(), guard());
    let ids = fill(&mut svc, 3);
    corrupt_record(&path, &ids[2]);

    let err = svc.repair().unwrap_err();
    assert!(matches!(
        err,
        VaultError::MigrationPartialFailure { ref id, rewritten: 0, .. } if id == &ids[2]
    ));
}

#[test]
fn rerun_after_rotating_bad_entry_completes() {
    let mut svc = service();
    let ids = fill(&mut svc, 4);
    tamper(svc.store_mut(), &ids[1]);
    assert!(svc.set_mode(CryptoMode::PostQuantum).is_err());

    svc.rotate_key(&ids[1], "opaque", "string", b"key-1").unwrap();
    let report = svc.set_mode(CryptoMode::PostQuantum).unwrap();

    // The first entry is re-sealed again; the pass always covers everything.
    assert_eq!(report.rewritten, 4);
    assert_eq!(svc.census().unwrap().post_quantum, 4);
    assert_all_readable(&svc, &ids);
}

#[test]
fn repair_rolls_stragglers_back_to_global_mode() {
    let mut svc = service();
    let ids = fill(&mut svc, 4);
    tamper(svc.store_mut(), &ids[2]);
    assert!(svc.set_mode(CryptoMode::PostQuantum).is_err());

    let report = svc.repair().unwrap();

    assert_eq!(report.rewritten, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(svc.mode().unwrap(), CryptoMode::Classical);
    assert_eq!(svc.census().unwrap().classical, 4);
    assert!(svc.retrieve(&ids[0]).is_ok());
    assert!(svc.retrieve(&ids[2]).is_err());
}

#[test]
fn atomic_failure_rolls_back_every_entry() {
    let mut svc = service().with_policy(MigrationPolicy::Atomic);
    let ids = fill(&mut svc, 4);
    tamper(svc.store_mut(), &ids[2]);
    let before = records(svc.store());

    let err = svc.set_mode(CryptoMode::PostQuantum).unwrap_err();
    assert!(matches!(
        err,
        VaultError::MigrationRolledBack { ref id, .. } if id == &ids[2]
    ));

    assert_eq!(svc.mode().unwrap(), CryptoMode::Classical);
    assert_eq!(records(svc.store()), before);
}

#[test]
fn migrator_can_be_driven_directly() {
    let g = guard();
    let mut store = VaultStore::open_in_memory().unwrap();
    for id in ["a", "b"] {
        store
            .put(&VaultEntry {
                id: id.to_string(),
                user_id: "u".into(),
                label: id.to_string(),
                key_type: "opaque".into(),
                key_encoding: "string".into(),
                created_at: Utc::now(),
                updated_at: None,
                envelope: Envelope::seal(&g, CryptoMode::Classical, id.as_bytes()).unwrap(),
            })
            .unwrap();
    }

    let report = ModeMigrator::new(&mut store, &g)
        .migrate(CryptoMode::PostQuantum)
        .unwrap();
    assert_eq!(report.rewritten, 2);
    assert_eq!(store.get_mode().unwrap(), CryptoMode::PostQuantum);
}

// ---------------------------------------------------------------------------
// End-to-end scenario
// ---------------------------------------------------------------------------

#[test]
fn deadbeef_survives_switch_to_quantum_safe() {
    let mut svc = service();
    let secret = KeyEncoding::Hex.decode("0xdeadbeef").unwrap();
    let entry = svc
        .store_key(NewKey {
            user_id: "alice",
            label: "demo",
            key_type: "opaque",
            key_encoding: "hex",
            secret: &secret,
        })
        .unwrap();
    assert_eq!(entry.crypto_mode(), CryptoMode::Classical);

    svc.set_mode("quantum-safe".parse().unwrap()).unwrap();
    assert_eq!(svc.mode().unwrap(), CryptoMode::PostQuantum);

    let stored = svc.store().get(&entry.id).unwrap();
    assert_eq!(stored.crypto_mode(), CryptoMode::PostQuantum);
    assert!(stored.envelope.classical().is_none());
    assert!(stored.envelope.post_quantum().is_some());

    let (_, plain) = svc.retrieve(&entry.id).unwrap();
    assert_eq!(plain.as_slice(), &[0xde, 0xad, 0xbe, 0xef]);
}
