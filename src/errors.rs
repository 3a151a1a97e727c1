use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur in PqVault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Input errors ---
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid crypto mode '{0}': must be 'classical' or 'quantum-safe'")]
    InvalidMode(String),

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Any authenticated-decrypt or unwrap verification failure.
    /// Never retried, never partially trusted.
    #[error("Authentication failed: wrong master key or corrupted record")]
    AuthenticationFailure,

    // --- Store errors ---
    #[error("Vault not initialized at {0} (run `pqvault init`)")]
    NotInitialized(PathBuf),

    #[error("Vault entry '{0}' not found")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // --- Migration errors ---
    #[error(
        "Migration stopped at entry '{id}' after {rewritten} entr(y/ies) were rewritten: {source}"
    )]
    MigrationPartialFailure {
        id: String,
        rewritten: usize,
        #[source]
        source: Box<VaultError>,
    },

    #[error("Migration rolled back at entry '{id}', no entries were changed: {source}")]
    MigrationRolledBack {
        id: String,
        #[source]
        source: Box<VaultError>,
    },

    // --- Master secret errors ---
    #[error("Keyfile error: {0}")]
    Keyfile(String),

    // --- Config errors ---
    #[error("Config error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl From<rusqlite::Error> for VaultError {
    fn from(e: rusqlite::Error) -> Self {
        VaultError::Storage(e.to_string())
    }
}

/// Convenience type alias for PqVault results.
pub type Result<T> = std::result::Result<T, VaultError>;
