//! `pqvault init`: create the database and seed the global crypto mode.

use tracing::warn;

use crate::cli::output;
use crate::cli::{load_settings, project_dir, Cli};
use crate::errors::Result;
use crate::vault::VaultStore;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let cwd = project_dir()?;
    let settings = load_settings(cli)?;
    let path = settings.db_path(&cwd);

    let existed = path.exists();
    let store = VaultStore::open(&path)?;
    let mode = store.get_mode()?;

    if existed {
        output::info(&format!(
            "Vault already initialized at {} ({} key(s), mode {mode})",
            path.display(),
            store.len()?
        ));
    } else {
        output::success(&format!(
            "Vault created at {} (mode {mode})",
            path.display()
        ));
    }

    // Only commands that touch entries need the master key.
    if let Err(e) = settings.load_master_key(&cwd) {
        warn!(error = %e, "master key not available");
        output::warning(&format!("Master key not available: {e}"));
        output::tip("Run `pqvault keygen` and export the result as PRIVATE_KEY_AES.");
    }

    output::tip("Run `pqvault store --label <LABEL> <VALUE>` to add a key.");
    Ok(())
}
