//! `apivault list` — display record metadata.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::vault::SecretMetadata;

/// Execute the `list` command.
pub fn execute(cli: &Cli, settings: &Settings, key_name: Option<&str>, json: bool) -> Result<()> {
    let store = open_store(cli, settings)?;

    let secrets: Vec<SecretMetadata> = match key_name {
        Some(name) => store.list_by_key_name(name)?,
        None => {
            let mut all = Vec::new();
            for name in store.key_names()? {
                all.extend(store.list_by_key_name(&name)?);
            }
            all
        }
    };

    if json {
        let out = serde_json::to_string_pretty(&secrets)
            .map_err(|e| VaultError::Serialization(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    output::info(&format!("{} record(s)", secrets.len()));
    output::print_secrets_table(&secrets);

    Ok(())
}
