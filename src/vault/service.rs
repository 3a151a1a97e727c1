//! High-level vault operations used by the CLI (or any other caller).
//!
//! `VaultService` wraps the store and the master key guard so callers
//! work with simple method calls like `service.store_key(...)` and
//! `service.retrieve(id)`.  The caller decodes transport encodings
//! before calling in; the service only ever sees raw key bytes.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::entry::{EntryMetadata, KeyEncoding, VaultEntry};
use super::migrate::{MigrationPolicy, MigrationReport, ModeMigrator};
use super::store::{ModeCensus, VaultStore};
use crate::config::Settings;
use crate::crypto::{CryptoMode, Envelope, KeyType, MasterKeyGuard};
use crate::errors::Result;

/// A request to store a new key.
#[derive(Debug, Clone, Copy)]
pub struct NewKey<'a> {
    pub user_id: &'a str,
    pub label: &'a str,
    pub key_type: &'a str,
    pub key_encoding: &'a str,
    pub secret: &'a [u8],
}

/// The main vault handle.
pub struct VaultService {
    store: VaultStore,
    guard: MasterKeyGuard,
    policy: MigrationPolicy,
}

impl VaultService {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    pub fn new(store: VaultStore, guard: MasterKeyGuard) -> Self {
        Self {
            store,
            guard,
            policy: MigrationPolicy::default(),
        }
    }

    /// Open the store and load the master key as configured.
    ///
    /// A missing or malformed master key fails here, before any entry
    /// is touched.
    pub fn open(settings: &Settings, project_dir: &std::path::Path) -> Result<Self> {
        let key = settings.load_master_key(project_dir)?;
        let store = VaultStore::open(&settings.db_path(project_dir))?;
        Ok(Self::new(store, MasterKeyGuard::new(key)).with_policy(settings.migration_policy))
    }

    pub fn with_policy(mut self, policy: MigrationPolicy) -> Self {
        self.policy = policy;
        self
    }

    // ------------------------------------------------------------------
    // Key operations
    // ------------------------------------------------------------------

    /// Seal and persist a new key under the current global mode.
    pub fn store_key(&mut self, request: NewKey<'_>) -> Result<VaultEntry> {
        validate_key(request.key_type, request.key_encoding, request.secret)?;

        let mode = self.store.get_mode()?;
        let envelope = Envelope::seal(&self.guard, mode, request.secret)?;

        let entry = VaultEntry {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id.to_string(),
            label: request.label.to_string(),
            key_type: request.key_type.to_string(),
            key_encoding: request.key_encoding.to_string(),
            created_at: Utc::now(),
            updated_at: None,
            envelope,
        };
        self.store.put(&entry)?;

        info!(id = %entry.id, user = %entry.user_id, mode = %mode, "stored key");
        Ok(entry)
    }

    /// Fetch an entry and decrypt it with the scheme recorded on it.
    pub fn retrieve(&self, id: &str) -> Result<(VaultEntry, Zeroizing<Vec<u8>>)> {
        let entry = self.store.get(id)?;
        let secret = entry.envelope.open(&self.guard)?;
        info!(id = %entry.id, user = %entry.user_id, mode = %entry.crypto_mode(), "retrieved key");
        Ok((entry, secret))
    }

    /// Replace the key held by `id` with new material, sealed under the
    /// current global mode.
    pub fn rotate_key(
        &mut self,
        id: &str,
        key_type: &str,
        key_encoding: &str,
        secret: &[u8],
    ) -> Result<VaultEntry> {
        validate_key(key_type, key_encoding, secret)?;

        let mode = self.store.get_mode()?;
        let guard = &self.guard;
        let entry = self.store.update(id, |mut entry| {
            entry.envelope = Envelope::seal(guard, mode, secret)?;
            entry.key_type = key_type.to_string();
            entry.key_encoding = key_encoding.to_string();
            entry.updated_at = Some(Utc::now());
            Ok(entry)
        })?;

        info!(id = %entry.id, user = %entry.user_id, mode = %mode, "rotated key");
        Ok(entry)
    }

    /// Metadata for all entries, optionally only those tagged with `user_id`.
    pub fn list(&self, user_id: Option<&str>) -> Result<Vec<EntryMetadata>> {
        Ok(self
            .store
            .entries()?
            .iter()
            .filter(|e| user_id.map_or(true, |u| e.user_id == u))
            .map(VaultEntry::metadata)
            .collect())
    }

    // ------------------------------------------------------------------
    // Mode operations
    // ------------------------------------------------------------------

    pub fn mode(&self) -> Result<CryptoMode> {
        self.store.get_mode()
    }

    /// Switch the whole store to `target` using the configured policy.
    pub fn set_mode(&mut self, target: CryptoMode) -> Result<MigrationReport> {
        ModeMigrator::new(&mut self.store, &self.guard)
            .with_policy(self.policy)
            .migrate(target)
    }

    /// Re-seal entries left in the wrong mode by an interrupted migration.
    pub fn repair(&mut self) -> Result<MigrationReport> {
        ModeMigrator::new(&mut self.store, &self.guard).repair()
    }

    pub fn census(&self) -> Result<ModeCensus> {
        self.store.mode_census()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn store(&self) -> &VaultStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VaultStore {
        &mut self.store
    }
}

/// Check the declared type against the key bytes and the declared encoding.
fn validate_key(key_type: &str, key_encoding: &str, secret: &[u8]) -> Result<()> {
    let key_type: KeyType = key_type.parse()?;
    let _: KeyEncoding = key_encoding.parse()?;
    key_type.validate(secret)
}
