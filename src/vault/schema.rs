//! SQLite schema and row mapping for `api_secrets`.
//!
//! Default uniqueness lives in the schema itself: the partial unique
//! index allows at most one active default row per `key_name`, no matter
//! how many connections write concurrently.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};

use crate::audit;
use crate::errors::Result;

use super::secret::SecretRecord;

/// Name of the partial unique index guarding default uniqueness.
pub const DEFAULT_INDEX: &str = "ux_api_secrets_active_default";

const SECRETS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS api_secrets (
    id           TEXT PRIMARY KEY NOT NULL,
    key_name     TEXT NOT NULL,
    cipher_text  TEXT NOT NULL,
    service_name TEXT,
    key_label    TEXT,
    key_type     TEXT,
    description  TEXT,
    docs_url     TEXT,
    is_active    INTEGER NOT NULL DEFAULT 1,
    is_default   INTEGER NOT NULL DEFAULT 0,
    created_by   TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_api_secrets_key_name
    ON api_secrets (key_name, created_at);

CREATE UNIQUE INDEX IF NOT EXISTS ux_api_secrets_active_default
    ON api_secrets (key_name)
    WHERE is_default = 1 AND is_active = 1;
";

/// Column list matching `record_from_row`.
pub const RECORD_COLUMNS: &str = "id, key_name, cipher_text, service_name, key_label, key_type, \
     description, docs_url, is_active, is_default, created_by, created_at, updated_at";

/// Create tables and indexes if they do not exist yet.
pub fn apply(conn: &Connection) -> Result<()> {
    conn.execute_batch(SECRETS_SCHEMA)?;
    conn.execute_batch(audit::SCHEMA)?;
    Ok(())
}

/// Map a row selected with `RECORD_COLUMNS`.
pub fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SecretRecord> {
    Ok(SecretRecord {
        id: row.get(0)?,
        key_name: row.get(1)?,
        cipher_text: row.get(2)?,
        service_name: row.get(3)?,
        key_label: row.get(4)?,
        key_type: row.get(5)?,
        description: row.get(6)?,
        docs_url: row.get(7)?,
        is_active: row.get(8)?,
        is_default: row.get(9)?,
        created_by: row.get(10)?,
        created_at: timestamp_column(row, 11)?,
        updated_at: timestamp_column(row, 12)?,
    })
}

/// Current time at the precision the database stores.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Read an RFC 3339 text column.
pub fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
