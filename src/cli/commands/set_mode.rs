//! `pqvault set-mode`: migrate every entry to a new crypto mode.

use crate::cli::output;
use crate::cli::{open_service, Cli};
use crate::crypto::CryptoMode;
use crate::errors::{Result, VaultError};
use crate::vault::MigrationPolicy;

/// Execute the `set-mode` command.
pub fn execute(cli: &Cli, mode: &str, atomic: bool) -> Result<()> {
    let target: CryptoMode = mode.parse()?;

    let mut service = open_service(cli)?;
    if atomic {
        service = service.with_policy(MigrationPolicy::Atomic);
    }

    let report = match service.set_mode(target) {
        Ok(report) => report,
        Err(e @ VaultError::MigrationPartialFailure { .. }) => {
            output::tip("The global mode was not changed. Fix or rotate the failing entry,");
            output::tip("then rerun `pqvault set-mode`, or run `pqvault repair` to roll back.");
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    if report.is_noop() {
        output::info(&format!("Crypto mode is already {target}, nothing to do."));
    } else {
        output::success(&format!(
            "Crypto mode changed from {} to {} ({} key(s) re-encrypted)",
            report.from, report.to, report.rewritten
        ));
    }

    Ok(())
}
