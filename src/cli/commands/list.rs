//! `pqvault list`: display stored keys in a table.

use crate::cli::output;
use crate::cli::{open_service, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let service = open_service(cli)?;
    let entries = service.list(cli.user.as_deref())?;

    let scope = match &cli.user {
        Some(user) => format!("user '{user}'"),
        None => "all users".to_string(),
    };
    output::info(&format!("{scope}: {} key(s)", entries.len()));
    output::print_entries_table(&entries);

    Ok(())
}
