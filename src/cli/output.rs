//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::crypto::CryptoMode;
use crate::vault::{EntryMetadata, ModeCensus};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of entry metadata.
pub fn print_entries_table(entries: &[EntryMetadata]) {
    if entries.is_empty() {
        info("No keys in this vault yet.");
        tip("Run `pqvault store --label <LABEL> <VALUE>` to add your first key.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "User", "Label", "Type", "Mode", "Created", "Updated"]);

    for e in entries {
        table.add_row(vec![
            e.id.clone(),
            e.user_id.clone(),
            e.label.clone(),
            e.key_type.clone(),
            e.crypto_mode.to_string(),
            e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            e.updated_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }

    println!("{table}");
}

/// Print per-mode entry counts.
pub fn print_census_table(census: &ModeCensus) {
    let mut table = Table::new();
    table.set_header(vec!["Mode", "Entries"]);
    for mode in CryptoMode::ALL {
        table.add_row(vec![mode.to_string(), census.count(mode).to_string()]);
    }
    println!("{table}");
}
