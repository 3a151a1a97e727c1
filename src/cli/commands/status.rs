//! `pqvault status`: database path, global mode and per-mode counts.

use crate::cli::output;
use crate::cli::{load_settings, project_dir, Cli};
use crate::errors::Result;
use crate::vault::VaultStore;

/// Execute the `status` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let path = settings.db_path(&project_dir()?);
    let store = VaultStore::open_existing(&path)?;

    let mode = store.get_mode()?;
    let census = store.mode_census()?;

    output::info(&format!("Database: {}", path.display()));
    output::info(&format!("Crypto mode: {mode}"));
    output::info(&format!("Migration policy: {}", settings.migration_policy));
    output::print_census_table(&census);

    let stragglers = census.total() - census.count(mode);
    if stragglers > 0 {
        output::warning(&format!(
            "{stragglers} key(s) are not in the global mode (interrupted migration?)"
        ));
        output::tip("Run `pqvault repair` or rerun `pqvault set-mode`.");
    }

    Ok(())
}
