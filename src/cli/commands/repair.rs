//! `pqvault repair`: re-seal entries not in the global crypto mode.

use crate::cli::output;
use crate::cli::{open_service, Cli};
use crate::errors::Result;

/// Execute the `repair` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut service = open_service(cli)?;
    let report = service.repair()?;

    if report.rewritten == 0 {
        output::info(&format!("All keys are already {}.", report.to));
    } else {
        output::success(&format!(
            "Re-encrypted {} key(s) under {}",
            report.rewritten, report.to
        ));
    }

    Ok(())
}
