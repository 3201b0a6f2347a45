//! `apivault register` / `apivault add` — store a credential.

use crate::cli::output;
use crate::cli::{open_store, read_secret_value, Cli, DetailsArgs};
use crate::config::Settings;
use crate::errors::Result;

/// How the new value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Rotate the active record in place, or create the first one.
    Register,
    /// Always create another active record.
    Add,
}

/// Execute the `register` or `add` command.
pub fn execute(
    cli: &Cli,
    settings: &Settings,
    key_name: &str,
    value: Option<&str>,
    details: &DetailsArgs,
    mode: Mode,
) -> Result<()> {
    // Open the vault first so a bad master key fails before prompting.
    let store = open_store(cli, settings)?;
    let secret_value = read_secret_value(key_name, value)?;
    let details = details.to_details();

    let before = store.list_by_key_name(key_name)?;
    let record = match mode {
        Mode::Register => store.register(key_name, &secret_value, &details)?,
        Mode::Add => store.add(key_name, &secret_value, &details)?,
    };

    let rotated = before.iter().any(|m| m.id == record.id);
    if rotated {
        output::success(&format!("Rotated '{key_name}' (record {})", record.id));
    } else {
        output::success(&format!("Stored '{key_name}' as record {}", record.id));
    }

    if record.is_default {
        output::info(&format!("Record {} is the default for '{key_name}'", record.id));
    } else if !rotated {
        output::tip(&format!(
            "Make it the default with: apivault set-default {}",
            record.id
        ));
    }

    println!("{}", record.id);
    Ok(())
}
