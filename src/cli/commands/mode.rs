//! `pqvault mode`: print the global crypto mode.

use crate::cli::{load_settings, project_dir, Cli};
use crate::errors::Result;
use crate::vault::VaultStore;

/// Execute the `mode` command.
///
/// Reads the flag directly; no master key needed.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let store = VaultStore::open_existing(&settings.db_path(&project_dir()?))?;
    println!("{}", store.get_mode()?);
    Ok(())
}
