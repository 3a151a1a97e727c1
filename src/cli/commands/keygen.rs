//! `pqvault keygen`: generate a fresh master key.
//!
//! Without a path the key is printed as 64 hex characters, ready for
//! `PRIVATE_KEY_AES`.  With a path it is written as a 32-byte keyfile.

use std::path::PathBuf;

use crate::cli::output;
use crate::crypto::{generate_keyfile, MasterKey};
use crate::errors::Result;

/// Execute the `keygen` command.
pub fn execute(path: Option<&str>) -> Result<()> {
    let Some(path) = path else {
        let key = MasterKey::generate();
        println!("{}", key.to_hex().as_str());
        return Ok(());
    };

    let path = PathBuf::from(path);
    generate_keyfile(&path)?;

    output::success(&format!("Keyfile generated at {}", path.display()));
    output::warning("Keep this file secret! Anyone with it can decrypt every stored key.");
    output::tip("Set `master_keyfile` in .pqvault.toml to use it.");

    Ok(())
}
