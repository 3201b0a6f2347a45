//! `apivault update` — change a record's descriptive metadata.
//!
//! Only the flags given are changed; every other field keeps its stored
//! value.

use crate::cli::output;
use crate::cli::{open_store, Cli, DetailsArgs};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `update` command.
pub fn execute(cli: &Cli, settings: &Settings, id: &str, details: &DetailsArgs) -> Result<()> {
    let store = open_store(cli, settings)?;
    let current = store.get(id)?;
    let record = store.update_details(id, &details.merged_onto(&current))?;

    output::success(&format!("Updated details of record {id} ('{}')", record.key_name));
    Ok(())
}
