//! `apivault set-default` — designate the default record for a key name.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `set-default` command.
pub fn execute(cli: &Cli, settings: &Settings, id: &str) -> Result<()> {
    let store = open_store(cli, settings)?;
    let record = store.set_default(id)?;

    output::success(&format!(
        "Record {id} is now the default for '{}'",
        record.key_name
    ));

    Ok(())
}
