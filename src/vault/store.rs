//! VaultStore: transactional persistence for entries and the mode flag.
//!
//! Backed by a single SQLite database with two collections:
//!
//! - `vault`: entry id -> serialized `VaultEntry` record
//! - `settings`: the well-known key `cryptomode` -> current `CryptoMode`
//!
//! Every public operation runs as one SQLite transaction.  Write
//! transactions are taken with `BEGIN IMMEDIATE`, so writers serialize
//! against each other while readers keep reading.  Iteration order is
//! insertion order (`seq`), which is also the order a migration walks.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::entry::VaultEntry;
use super::format::{decode_entry, encode_entry};
use crate::crypto::CryptoMode;
use crate::errors::{Result, VaultError};

/// Settings key holding the global crypto mode.
pub const MODE_KEY: &str = "cryptomode";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS vault (
        seq     INTEGER PRIMARY KEY AUTOINCREMENT,
        id      TEXT NOT NULL UNIQUE,
        record  BLOB NOT NULL
    );

    CREATE TABLE IF NOT EXISTS settings (
        key     TEXT PRIMARY KEY,
        value   TEXT NOT NULL
    );
";

/// Per-mode entry counts, used to inspect a store after a failed migration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeCensus {
    pub classical: usize,
    pub post_quantum: usize,
}

impl ModeCensus {
    pub fn count(&self, mode: CryptoMode) -> usize {
        match mode {
            CryptoMode::Classical => self.classical,
            CryptoMode::PostQuantum => self.post_quantum,
        }
    }

    pub fn total(&self) -> usize {
        self.classical + self.post_quantum
    }

    /// `true` if entries of both modes are present.
    pub fn is_mixed(&self) -> bool {
        self.classical > 0 && self.post_quantum > 0
    }
}

/// The persistent entry store.
pub struct VaultStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Open (or create) the store at `path`.
    ///
    /// Creates both collections if missing and writes the default
    /// `classical` mode flag on first run.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Owner-only access to the database file.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init()?;
        debug!(path = %path.display(), "opened vault store");
        Ok(store)
    }

    /// Open a store that must already exist.
    ///
    /// Fails with `NotInitialized` instead of creating the file, for
    /// commands that only read.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VaultError::NotInitialized(path.to_path_buf()));
        }
        Self::open(path)
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![MODE_KEY, CryptoMode::default().as_str()],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------

    /// Insert or replace an entry, keyed by its id.
    pub fn put(&mut self, entry: &VaultEntry) -> Result<()> {
        self.with_transaction(|tx| tx.put(entry))
    }

    /// Fetch one entry. Fails with `NotFound` for an unknown id.
    pub fn get(&self, id: &str) -> Result<VaultEntry> {
        read_entry(&self.conn, id)
    }

    /// `true` if an entry with this id exists. No decryption is performed.
    pub fn contains(&self, id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT seq FROM vault WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    /// Read-modify-write one entry inside a single write transaction.
    ///
    /// `f` receives the current entry and returns its replacement.  The
    /// id may not change.  Nothing is written if `f` fails.
    pub fn update<F>(&mut self, id: &str, f: F) -> Result<VaultEntry>
    where
        F: FnOnce(VaultEntry) -> Result<VaultEntry>,
    {
        self.with_transaction(|tx| {
            let current = tx.get(id)?;
            let updated = f(current)?;
            if updated.id != id {
                return Err(VaultError::Validation(format!(
                    "entry id is immutable ('{id}' -> '{}')",
                    updated.id
                )));
            }
            tx.put(&updated)?;
            Ok(updated)
        })
    }

    /// All entry ids in insertion order.
    pub fn ids(&self) -> Result<Vec<String>> {
        read_ids(&self.conn)
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> Result<Vec<VaultEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT record FROM vault ORDER BY seq")?;
        let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(decode_entry(&row?)?);
        }
        Ok(entries)
    }

    /// Number of stored entries.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vault", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| VaultError::Storage(format!("bad row count {count}")))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Count entries per recorded crypto mode.
    pub fn mode_census(&self) -> Result<ModeCensus> {
        let mut census = ModeCensus::default();
        for entry in self.entries()? {
            match entry.crypto_mode() {
                CryptoMode::Classical => census.classical += 1,
                CryptoMode::PostQuantum => census.post_quantum += 1,
            }
        }
        Ok(census)
    }

    // ------------------------------------------------------------------
    // Mode flag
    // ------------------------------------------------------------------

    /// The global crypto mode. Defaults to `classical` if never set.
    pub fn get_mode(&self) -> Result<CryptoMode> {
        read_mode(&self.conn)
    }

    /// Persist the global crypto mode.
    pub fn set_mode(&mut self, mode: CryptoMode) -> Result<()> {
        self.with_transaction(|tx| tx.set_mode(mode))
    }

    /// Persist the global crypto mode from its string form.
    ///
    /// Anything other than `classical` or `quantum-safe` fails with
    /// `InvalidMode` and leaves the flag untouched.
    pub fn set_mode_str(&mut self, mode: &str) -> Result<()> {
        let mode: CryptoMode = mode.parse()?;
        self.set_mode(mode)
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Run `f` inside one write transaction.
    ///
    /// Commits if `f` returns `Ok`; rolls back everything `f` wrote if it
    /// returns `Err`.
    pub fn with_transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&StoreTransaction<'_>) -> Result<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&StoreTransaction { conn: &tx })?;
        tx.commit()?;
        Ok(out)
    }

    /// Path of the database file, if not in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Entry and mode access inside an open write transaction.
pub struct StoreTransaction<'a> {
    conn: &'a Connection,
}

impl StoreTransaction<'_> {
    pub fn get(&self, id: &str) -> Result<VaultEntry> {
        read_entry(self.conn, id)
    }

    pub fn put(&self, entry: &VaultEntry) -> Result<()> {
        let record = encode_entry(entry)?;
        self.conn.execute(
            "INSERT INTO vault (id, record) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET record = excluded.record",
            params![entry.id, record],
        )?;
        Ok(())
    }

    pub fn ids(&self) -> Result<Vec<String>> {
        read_ids(self.conn)
    }

    pub fn get_mode(&self) -> Result<CryptoMode> {
        read_mode(self.conn)
    }

    pub fn set_mode(&self, mode: CryptoMode) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![MODE_KEY, mode.as_str()],
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shared queries (plain connection or transaction)
// ---------------------------------------------------------------------------

fn read_entry(conn: &Connection, id: &str) -> Result<VaultEntry> {
    let record: Option<Vec<u8>> = conn
        .query_row(
            "SELECT record FROM vault WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    match record {
        Some(bytes) => decode_entry(&bytes),
        None => Err(VaultError::NotFound(id.to_string())),
    }
}

fn read_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM vault ORDER BY seq")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

fn read_mode(conn: &Connection) -> Result<CryptoMode> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![MODE_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        Some(v) => v.parse(),
        None => Ok(CryptoMode::default()),
    }
}
