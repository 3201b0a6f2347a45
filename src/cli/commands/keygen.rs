//! `apivault keygen` — print a fresh random master key.

use crate::cli::output;
use crate::crypto::MasterKey;
use crate::errors::Result;

/// Execute the `keygen` command.
pub fn execute() -> Result<()> {
    let key = MasterKey::generate();
    println!("{}", key.to_hex());

    output::warning("Store this key securely — records encrypted with it cannot be recovered without it.");
    Ok(())
}
