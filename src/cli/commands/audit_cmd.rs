//! `apivault audit` — display the audit log.
//!
//! Usage:
//!   apivault audit               # show last 50 entries
//!   apivault audit --last 20     # show last 20
//!   apivault audit --since 7d    # entries from last 7 days

use chrono::Utc;

use crate::audit::AuditEntry;
use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::{Result, VaultError};

/// Execute the `audit` command.
pub fn execute(cli: &Cli, settings: &Settings, last: usize, since: Option<&str>) -> Result<()> {
    let store = open_store(cli, settings)?;

    let since_dt = match since {
        Some(s) => Some(parse_duration(s)?),
        None => None,
    };

    let entries = store.audit_entries(last, since_dt)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);

    Ok(())
}

/// Parse a human-friendly duration string like "7d", "24h", "30m" into
/// the point in time that far in the past.
fn parse_duration(input: &str) -> Result<chrono::DateTime<Utc>> {
    let input = input.trim();
    let invalid = |reason: &str| {
        VaultError::CommandFailed(format!("invalid duration '{input}': {reason}"))
    };

    let (num_str, to_delta): (&str, fn(i64) -> Option<chrono::Duration>) =
        if let Some(s) = input.strip_suffix('d') {
            (s, chrono::Duration::try_days)
        } else if let Some(s) = input.strip_suffix('h') {
            (s, chrono::Duration::try_hours)
        } else if let Some(s) = input.strip_suffix('m') {
            (s, chrono::Duration::try_minutes)
        } else {
            return Err(invalid("use a format like 7d, 24h, or 30m"));
        };

    let num: i64 = num_str
        .parse()
        .map_err(|_| invalid("number part is not valid"))?;
    if num < 0 {
        return Err(invalid("must not be negative"));
    }

    to_delta(num)
        .and_then(|delta| Utc::now().checked_sub_signed(delta))
        .ok_or_else(|| invalid("too far in the past"))
}

/// Print audit entries in a formatted table.
pub fn print_audit_table(entries: &[AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Key", "Record", "Actor", "Details"]);

    for entry in entries {
        let time = entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let op = colorize_operation(&entry.operation);
        let record = entry.record_id.as_deref().unwrap_or("-");
        let actor = entry.actor.as_deref().unwrap_or("-");
        let details = entry.details.as_deref().unwrap_or("-");

        table.add_row(vec![
            time,
            op,
            entry.key_name.clone(),
            record.to_string(),
            actor.to_string(),
            details.to_string(),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

/// Colorize operation names for display.
fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "register" | "add" => style(op).green().to_string(),
        "rotate" => style(op).yellow().to_string(),
        "deactivate" => style(op).red().to_string(),
        "set-default" => style(op).blue().to_string(),
        "update" => style(op).cyan().to_string(),
        _ => op.to_string(),
    }
}
