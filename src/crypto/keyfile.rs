//! Master keyfile handling.
//!
//! A keyfile is a 32-byte random file holding the raw master secret.
//! It is one of the two master secret sources (the other is a hex
//! environment variable, see `config::Settings::load_master_key`).

use std::fs;
use std::path::Path;

use zeroize::Zeroize;

use super::keys::{MasterKey, KEY_LEN};
use crate::errors::{Result, VaultError};

/// Generate a new random master keyfile and write it to `path`.
///
/// The file is written with restrictive permissions (owner-only read).
/// Refuses to overwrite an existing file.
pub fn generate_keyfile(path: &Path) -> Result<MasterKey> {
    if path.exists() {
        return Err(VaultError::Keyfile(format!(
            "keyfile already exists at {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                VaultError::Keyfile(format!("cannot create keyfile directory: {e}"))
            })?;
        }
    }

    let key = MasterKey::generate();
    fs::write(path, key.as_bytes())
        .map_err(|e| VaultError::Keyfile(format!("failed to write keyfile: {e}")))?;

    // On Unix, restrict permissions to owner-only read/write.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms).map_err(|e| {
            VaultError::Keyfile(format!("failed to set keyfile permissions: {e}"))
        })?;
    }

    Ok(key)
}

/// Load a master keyfile from disk and validate its length.
pub fn load_keyfile(path: &Path) -> Result<MasterKey> {
    if !path.exists() {
        return Err(VaultError::Keyfile(format!(
            "keyfile not found at {}",
            path.display()
        )));
    }

    let mut data = fs::read(path)
        .map_err(|e| VaultError::Keyfile(format!("failed to read keyfile: {e}")))?;

    if data.len() != KEY_LEN {
        let len = data.len();
        data.zeroize();
        return Err(VaultError::Keyfile(format!(
            "keyfile must be exactly {KEY_LEN} bytes, got {len}"
        )));
    }

    let key = MasterKey::from_slice(&data);
    data.zeroize();
    key
}
