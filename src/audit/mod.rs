//! Audit log — SQLite-based history of vault mutations.
//!
//! Every mutation (register, rotate, add, deactivate, set-default,
//! update) appends a row to `audit_log` inside the same transaction as
//! the change itself, so the history can never disagree with the data.
//! Entries carry names and ids only, never plaintext or ciphertext.

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::errors::Result;
use crate::vault::schema::{format_timestamp, timestamp_column};

pub(crate) const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS audit_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp   TEXT NOT NULL,
    operation   TEXT NOT NULL,
    key_name    TEXT NOT NULL,
    record_id   TEXT,
    actor       TEXT,
    details     TEXT
);";

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub key_name: String,
    pub record_id: Option<String>,
    pub actor: Option<String>,
    pub details: Option<String>,
}

/// One event to append.
pub(crate) struct AuditEvent<'a> {
    pub operation: &'a str,
    pub key_name: &'a str,
    pub record_id: &'a str,
    pub actor: Option<&'a str>,
    pub details: Option<&'a str>,
}

/// Append an event.  Runs on the caller's connection or transaction.
pub(crate) fn record(conn: &Connection, event: &AuditEvent<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO audit_log (timestamp, operation, key_name, record_id, actor, details)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            format_timestamp(Utc::now()),
            event.operation,
            event.key_name,
            event.record_id,
            event.actor,
            event.details
        ],
    )?;
    Ok(())
}

/// Query recent audit entries.
///
/// - `limit`: maximum number of entries to return (most recent first).
/// - `since`: if provided, only return entries newer than this timestamp.
pub fn query(
    conn: &Connection,
    limit: usize,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<AuditEntry>> {
    let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
    let since_text = since.map_or_else(String::new, format_timestamp);

    let mut stmt = conn.prepare(
        "SELECT id, timestamp, operation, key_name, record_id, actor, details
         FROM audit_log
         WHERE timestamp >= ?1
         ORDER BY id DESC
         LIMIT ?2",
    )?;

    let rows = stmt.query_map(rusqlite::params![since_text, limit_i64], |row| {
        Ok(AuditEntry {
            id: row.get(0)?,
            timestamp: timestamp_column(row, 1)?,
            operation: row.get(2)?,
            key_name: row.get(3)?,
            record_id: row.get(4)?,
            actor: row.get(5)?,
            details: row.get(6)?,
        })
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }

    Ok(entries)
}
