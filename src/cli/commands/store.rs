//! `pqvault store`: encrypt and persist a new key.

use crate::cli::output;
use crate::cli::{open_service, read_secret, Cli};
use crate::errors::Result;
use crate::vault::{KeyEncoding, NewKey};

/// Execute the `store` command.
pub fn execute(
    cli: &Cli,
    label: &str,
    key_type: &str,
    encoding: &str,
    value: Option<&str>,
) -> Result<()> {
    // Reject a bad encoding before prompting for anything.
    let key_encoding: KeyEncoding = encoding.parse()?;
    let input = read_secret(value, &format!("Enter {key_type} key ({key_encoding})"))?;
    let secret = key_encoding.decode(&input)?;

    let mut service = open_service(cli)?;
    let entry = service.store_key(NewKey {
        user_id: cli.user_id(),
        label,
        key_type,
        key_encoding: key_encoding.as_str(),
        secret: &secret,
    })?;

    output::success(&format!(
        "Stored key '{}' as {} ({})",
        entry.label,
        entry.id,
        entry.crypto_mode()
    ));
    output::tip(&format!("Run `pqvault get {}` to read it back.", entry.id));

    Ok(())
}
