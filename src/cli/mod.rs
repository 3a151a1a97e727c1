//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::vault::VaultService;

/// Owner tag used by `store` when `--user` is not given.
pub const DEFAULT_USER: &str = "local";

/// PqVault CLI: key vault with classical and post-quantum envelopes.
#[derive(Parser)]
#[command(
    name = "pqvault",
    about = "Key vault with switchable classical / post-quantum encryption",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database file (overrides .pqvault.toml and VAULT_DB)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Owner tag for stored keys; filters `list`
    #[arg(short, long, global = true)]
    pub user: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate a master key (prints hex, or writes a keyfile)
    Keygen {
        /// Write 32 raw bytes to this path instead of printing hex
        path: Option<String>,
    },

    /// Create the database and seed the crypto mode
    Init,

    /// Encrypt and store a key
    Store {
        /// Human-readable label
        #[arg(short, long)]
        label: String,

        /// Declared key type (opaque, secp256k1, ed25519, kyber512, kyber768, kyber1024)
        #[arg(short = 't', long = "type", default_value = "opaque")]
        key_type: String,

        /// Input/output encoding: hex or string
        #[arg(short, long, default_value = "hex")]
        encoding: String,

        /// Key value (omit for interactive prompt or stdin)
        value: Option<String>,
    },

    /// Decrypt and print a stored key
    Get {
        /// Entry id
        id: String,
    },

    /// Replace the key material of an entry
    Rotate {
        /// Entry id
        id: String,

        #[arg(short = 't', long = "type", default_value = "opaque")]
        key_type: String,

        #[arg(short, long, default_value = "hex")]
        encoding: String,

        /// New key value (omit for interactive prompt or stdin)
        value: Option<String>,
    },

    /// List stored keys (metadata only)
    List,

    /// Show the global crypto mode
    Mode,

    /// Re-encrypt every entry under a new crypto mode
    SetMode {
        /// classical or quantum-safe
        mode: String,

        /// Roll back the whole pass on any failure
        #[arg(long)]
        atomic: bool,
    },

    /// Re-seal entries left behind by an interrupted migration
    Repair,

    /// Show database path, mode, and per-mode entry counts
    Status,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

impl Cli {
    /// Owner tag for new entries.
    pub fn user_id(&self) -> &str {
        self.user.as_deref().unwrap_or(DEFAULT_USER)
    }
}

/// Project root: the current working directory.
pub fn project_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?)
}

/// Load settings from the project root and apply `--db`.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(&project_dir()?)?;
    if let Some(db) = &cli.db {
        settings.db_path = db.clone();
    }
    Ok(settings)
}

/// Load settings and the master key, then open the store.
pub fn open_service(cli: &Cli) -> Result<VaultService> {
    let settings = load_settings(cli)?;
    VaultService::open(&settings, &project_dir()?)
}

/// Get a key value, trying in order:
/// 1. The value given on the command line
/// 2. Piped stdin
/// 3. Interactive hidden prompt
///
/// Returns `Zeroizing<String>` so the value is wiped from memory on drop.
pub fn read_secret(value: Option<&str>, prompt: &str) -> Result<Zeroizing<String>> {
    if let Some(v) = value {
        output::warning("Key provided on command line, it may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = Zeroizing::new(buf.trim_end().to_string());
        return Ok(trimmed);
    }

    let value = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}
