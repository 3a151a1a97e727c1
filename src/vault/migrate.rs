//! ModeMigrator: re-encrypts the whole store under a new crypto mode.
//!
//! Each entry is opened with the scheme recorded on the entry itself
//! (not the global flag), re-sealed under the target scheme, and written
//! back.  The global flag flips only after every entry was rewritten, so
//! the flag is always trustworthy even when individual entries are not.
//!
//! Two policies are available:
//!
//! - `PerEntry` (default): one transaction per entry.  A failure stops
//!   the pass with `MigrationPartialFailure`; entries before the failing
//!   one stay rewritten and the flag is unchanged.  `repair` finishes
//!   the job once the bad entry is dealt with.
//! - `Atomic`: every rewrite and the flag flip share one transaction.
//!   A failure rolls back the whole pass (`MigrationRolledBack`).

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::entry::VaultEntry;
use super::store::VaultStore;
use crate::crypto::{CryptoMode, Envelope, MasterKeyGuard};
use crate::errors::{Result, VaultError};

/// How a migration pass commits its writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationPolicy {
    #[default]
    PerEntry,
    Atomic,
}

impl fmt::Display for MigrationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationPolicy::PerEntry => f.write_str("per-entry"),
            MigrationPolicy::Atomic => f.write_str("atomic"),
        }
    }
}

impl FromStr for MigrationPolicy {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "per-entry" => Ok(MigrationPolicy::PerEntry),
            "atomic" => Ok(MigrationPolicy::Atomic),
            other => Err(VaultError::Validation(format!(
                "unknown migration policy '{other}', use 'per-entry' or 'atomic'"
            ))),
        }
    }
}

/// Outcome of a successful migration or repair pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Global mode before the pass.
    pub from: CryptoMode,
    /// Global mode after the pass.
    pub to: CryptoMode,
    /// Entries re-sealed by this pass.
    pub rewritten: usize,
    /// Entries left alone (repair only: already in the global mode).
    pub skipped: usize,
}

impl MigrationReport {
    fn unchanged(mode: CryptoMode) -> Self {
        Self {
            from: mode,
            to: mode,
            rewritten: 0,
            skipped: 0,
        }
    }

    /// `true` if the pass touched nothing.
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.rewritten == 0
    }
}

/// Drives a store-wide pass.
///
/// Holds the store mutably for its whole lifetime, so nothing else in
/// the process can write entries or the mode flag while it runs.
pub struct ModeMigrator<'a> {
    store: &'a mut VaultStore,
    guard: &'a MasterKeyGuard,
    policy: MigrationPolicy,
}

impl<'a> ModeMigrator<'a> {
    pub fn new(store: &'a mut VaultStore, guard: &'a MasterKeyGuard) -> Self {
        Self {
            store,
            guard,
            policy: MigrationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MigrationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Re-encrypt every entry under `target`, then flip the global flag.
    ///
    /// A no-op (nothing read, nothing written) if `target` is already
    /// the global mode.
    pub fn migrate(&mut self, target: CryptoMode) -> Result<MigrationReport> {
        let current = self.store.get_mode()?;
        if current == target {
            info!(mode = %target, "crypto mode unchanged, nothing to migrate");
            return Ok(MigrationReport::unchanged(current));
        }

        info!(from = %current, to = %target, policy = %self.policy, "starting crypto mode migration");

        let rewritten = match self.policy {
            MigrationPolicy::PerEntry => {
                let rewritten = self.rewrite_each(target, |_| true)?;
                self.store.set_mode(target)?;
                rewritten
            }
            MigrationPolicy::Atomic => self.rewrite_atomically(target)?,
        };

        info!(from = %current, to = %target, rewritten, "crypto mode migration complete");
        Ok(MigrationReport {
            from: current,
            to: target,
            rewritten,
            skipped: 0,
        })
    }

    /// Re-seal only the entries whose own mode differs from the global
    /// mode.  The flag is not touched.
    ///
    /// This is the recovery path after a `MigrationPartialFailure`: run
    /// `migrate` again to move forward, or `repair` to pull stragglers
    /// back to the mode the flag still names.
    pub fn repair(&mut self) -> Result<MigrationReport> {
        let mode = self.store.get_mode()?;
        let total = self.store.len()?;

        info!(mode = %mode, "repairing entries not in the global crypto mode");
        let rewritten = self.rewrite_each(mode, |entry| entry.crypto_mode() != mode)?;
        if rewritten > 0 {
            warn!(mode = %mode, rewritten, "re-sealed mixed-mode entries");
        }

        Ok(MigrationReport {
            from: mode,
            to: mode,
            rewritten,
            skipped: total.saturating_sub(rewritten),
        })
    }

    /// One write transaction per selected entry, in insertion order.
    fn rewrite_each<P>(&mut self, target: CryptoMode, select: P) -> Result<usize>
    where
        P: Fn(&VaultEntry) -> bool,
    {
        let guard = self.guard;
        let mut rewritten = 0;

        for id in self.store.ids()? {
            // A record that fails to decode stops the pass like any other bad entry.
            let outcome = match self.store.get(&id) {
                Ok(entry) if !select(&entry) => continue,
                Ok(_) => self
                    .store
                    .update(&id, |entry| reseal(guard, entry, target))
                    .map(drop),
                Err(source) => Err(source),
            };
            if let Err(source) = outcome {
                error!(id = %id, rewritten, error = %source, "migration stopped at entry");
                return Err(VaultError::MigrationPartialFailure {
                    id,
                    rewritten,
                    source: Box::new(source),
                });
            }

            rewritten += 1;
            debug!(id = %id, mode = %target, "entry re-sealed");
        }

        Ok(rewritten)
    }

    /// All rewrites and the flag flip in a single transaction.
    fn rewrite_atomically(&mut self, target: CryptoMode) -> Result<usize> {
        let guard = self.guard;

        self.store.with_transaction(|tx| {
            let mut rewritten = 0;
            for id in tx.ids()? {
                let resealed = tx.get(&id).and_then(|entry| reseal(guard, entry, target));
                let entry = match resealed {
                    Ok(entry) => entry,
                    Err(source) => {
                        error!(id = %id, error = %source, "migration rolled back");
                        return Err(VaultError::MigrationRolledBack {
                            id,
                            source: Box::new(source),
                        });
                    }
                };
                tx.put(&entry)?;
                rewritten += 1;
            }
            tx.set_mode(target)?;
            Ok(rewritten)
        })
    }
}

/// Open an entry with its own scheme and seal it again under `target`.
///
/// Replaces the whole envelope, so fields of the vacated scheme are gone.
fn reseal(guard: &MasterKeyGuard, mut entry: VaultEntry, target: CryptoMode) -> Result<VaultEntry> {
    let secret = entry.envelope.open(guard)?;
    entry.envelope = Envelope::seal(guard, target, &secret)?;
    entry.updated_at = Some(Utc::now());
    Ok(entry)
}
