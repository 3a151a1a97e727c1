//! `pqvault rotate`: replace the key material held by an entry.
//!
//! The new material is sealed under the current global mode, whatever
//! mode the old material was in.

use crate::cli::output;
use crate::cli::{open_service, read_secret, Cli};
use crate::errors::Result;
use crate::vault::KeyEncoding;

/// Execute the `rotate` command.
pub fn execute(
    cli: &Cli,
    id: &str,
    key_type: &str,
    encoding: &str,
    value: Option<&str>,
) -> Result<()> {
    let key_encoding: KeyEncoding = encoding.parse()?;
    let mut service = open_service(cli)?;

    // Fail on an unknown id before prompting.
    service.store().get(id)?;

    let input = read_secret(value, &format!("Enter new {key_type} key ({key_encoding})"))?;
    let secret = key_encoding.decode(&input)?;
    let entry = service.rotate_key(id, key_type, key_encoding.as_str(), &secret)?;

    output::success(&format!(
        "Rotated key '{}' ({}, {})",
        entry.label,
        entry.id,
        entry.crypto_mode()
    ));

    Ok(())
}
