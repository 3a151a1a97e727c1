use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::{load_keyfile, MasterKey};
use crate::errors::{Result, VaultError};
use crate::vault::MigrationPolicy;

/// Environment variable that overrides `db_path`.
pub const DB_PATH_ENV: &str = "VAULT_DB";

/// Project-level configuration, loaded from `.pqvault.toml`.
///
/// Every field has a default, so the vault runs without any config
/// file as long as the master key is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// SQLite database file (relative to the project root).
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Environment variable holding the master key as 64 hex characters.
    #[serde(default = "default_master_key_env")]
    pub master_key_env: String,

    /// Optional keyfile holding 32 raw master key bytes.
    /// Takes precedence over `master_key_env` when set.
    #[serde(default)]
    pub master_keyfile: Option<String>,

    /// How `set-mode` commits its writes.
    #[serde(default)]
    pub migration_policy: MigrationPolicy,

    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_db_path() -> String {
    "vault.db".to_string()
}

fn default_master_key_env() -> String {
    "PRIVATE_KEY_AES".to_string()
}

fn default_log_filter() -> String {
    "pqvault=info".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            master_key_env: default_master_key_env(),
            master_keyfile: None,
            migration_policy: MigrationPolicy::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".pqvault.toml";

    /// Load settings from `<project_dir>/.pqvault.toml`, then apply
    /// environment overrides.
    pub fn load(project_dir: &Path) -> Result<Self> {
        Self::load_with_env(project_dir, |name| std::env::var(name).ok())
    }

    /// Same as `load`, reading the environment through `lookup`.
    pub fn load_with_env<F>(project_dir: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = project_dir.join(Self::FILE_NAME);

        let mut settings = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&contents).map_err(|e| {
                VaultError::Config(format!("Failed to parse {}: {e}", config_path.display()))
            })?
        } else {
            Self::default()
        };

        if let Some(db) = lookup(DB_PATH_ENV).filter(|v| !v.is_empty()) {
            settings.db_path = db;
        }

        Ok(settings)
    }

    /// Full path to the database file.
    ///
    /// Absolute `db_path` values are used as-is.
    pub fn db_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.db_path)
    }

    /// Load the master key from the keyfile if one is configured,
    /// otherwise from the `master_key_env` environment variable.
    pub fn load_master_key(&self, project_dir: &Path) -> Result<MasterKey> {
        self.load_master_key_with_env(project_dir, |name| std::env::var(name).ok())
    }

    /// Same as `load_master_key`, reading the environment through `lookup`.
    pub fn load_master_key_with_env<F>(&self, project_dir: &Path, lookup: F) -> Result<MasterKey>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(keyfile) = &self.master_keyfile {
            return load_keyfile(&project_dir.join(keyfile));
        }

        let value = Zeroizing::new(lookup(&self.master_key_env).unwrap_or_default());
        if value.trim().is_empty() {
            return Err(VaultError::Config(format!(
                "{} not set: export a 64-character hex master key or configure master_keyfile",
                self.master_key_env
            )));
        }
        MasterKey::from_hex(&value)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
