//! `apivault deactivate` — retire a record without deleting it.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::{Result, VaultError};

/// Execute the `deactivate` command.
pub fn execute(cli: &Cli, settings: &Settings, id: &str, force: bool) -> Result<()> {
    let store = open_store(cli, settings)?;
    let record = store.get(id)?;

    // Unless --force is set, ask for confirmation before deactivating.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Deactivate record {id} of '{}'?",
                record.key_name
            ))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let updated = store.deactivate(id)?;
    output::success(&format!("Deactivated record {id} of '{}'", updated.key_name));

    if record.is_default {
        output::warning(&format!(
            "'{}' no longer has a default — choose one with `apivault set-default <ID>`",
            record.key_name
        ));
    }

    Ok(())
}
