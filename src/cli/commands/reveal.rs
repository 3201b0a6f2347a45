//! `apivault reveal` / `apivault reveal-default` — print a decrypted value.

use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::Result;

/// Execute the `reveal` command.
pub fn execute(cli: &Cli, settings: &Settings, id: &str) -> Result<()> {
    let store = open_store(cli, settings)?;

    // Decrypt and print the secret value to stdout.
    let value = store.reveal(id)?;
    println!("{value}");

    Ok(())
}

/// Execute the `reveal-default` command.
pub fn execute_default(cli: &Cli, settings: &Settings, key_name: &str) -> Result<()> {
    let store = open_store(cli, settings)?;

    let value = store.reveal_default(key_name)?;
    println!("{value}");

    Ok(())
}
