//! `pqvault get`: decrypt and print a single key.

use crate::cli::{open_service, Cli};
use crate::errors::Result;
use crate::vault::KeyEncoding;

/// Execute the `get` command.
pub fn execute(cli: &Cli, id: &str) -> Result<()> {
    let service = open_service(cli)?;
    let (entry, secret) = service.retrieve(id)?;

    // Print in the encoding the key was stored with.
    let encoding: KeyEncoding = entry.key_encoding.parse()?;
    let value = encoding.encode(&secret)?;
    println!("{}", value.as_str());

    Ok(())
}
