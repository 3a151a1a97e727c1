//! Vault module: encrypted key storage and crypto mode migration.
//!
//! This module provides:
//! - `VaultEntry`, `EntryMetadata` and `KeyEncoding` types (`entry`)
//! - The JSON record format and base64 serde helpers (`format`)
//! - `VaultStore`, the transactional SQLite store (`store`)
//! - `ModeMigrator`, the store-wide re-encryption pass (`migrate`)
//! - `VaultService`, the high-level API callers use (`service`)

pub mod entry;
pub mod format;
pub mod migrate;
pub mod service;
pub mod store;

// Re-export the most commonly used items.
pub use entry::{EntryMetadata, KeyEncoding, VaultEntry};
pub use migrate::{MigrationPolicy, MigrationReport, ModeMigrator};
pub use service::{NewKey, VaultService};
pub use store::{ModeCensus, StoreTransaction, VaultStore};
