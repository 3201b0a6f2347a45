//! High-level vault operations.
//!
//! `VaultStore` is the only component that reads or writes the
//! `api_secrets` table.  It encrypts on every write, decrypts on every
//! read-for-use, and owns the default-selection rules:
//!
//! - the first record ever registered for a key name becomes its default;
//! - re-registering an active key name rotates that record in place;
//! - deactivation clears the default flag and never reassigns it;
//! - `set_default` moves the flag in a single transaction.
//!
//! Every mutation runs in an `IMMEDIATE` transaction, which takes the
//! database write lock up front, so check-then-write sequences cannot
//! interleave across connections.  The partial unique index in `schema`
//! backs this up; a write that trips it is retried from scratch.
//!
//! A file-backed store keeps a second, query-only connection for reads.
//! Under WAL, reads never wait on the writer connection, which may sit in
//! the busy timeout behind another process's write lock.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior};
use uuid::Uuid;

use crate::audit::{self, AuditEntry, AuditEvent};
use crate::crypto::{decrypt, encrypt, MasterKey};
use crate::errors::{Result, VaultError};

use super::schema::{self, format_timestamp, record_from_row, RECORD_COLUMNS};
use super::secret::{validate_key_name, SecretDetails, SecretMetadata, SecretRecord};

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Attempts for a write that conflicts on the default index.
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// The main vault handle.  Open one with `VaultStore::open` and share it
/// between workers through an `Arc`.
pub struct VaultStore {
    conn: Mutex<Connection>,

    /// Read-only connection; `None` for in-memory stores, which read
    /// through `conn`.
    reader: Option<Mutex<Connection>>,

    /// Shared read-only master key (zeroized when the last owner drops).
    master_key: Arc<MasterKey>,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Open (or create) the vault database at `path`.
    pub fn open(path: &Path, master_key: Arc<MasterKey>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA secure_delete=ON;")?;

        // Set restrictive permissions on the database (owner-only).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(path, perms);
        }

        let mut store = Self::from_connection(conn, master_key)?;

        // Opened after the schema exists so the reader never creates it.
        let reader = Connection::open(path)?;
        reader.busy_timeout(BUSY_TIMEOUT)?;
        reader.execute_batch("PRAGMA query_only=ON;")?;
        store.reader = Some(Mutex::new(reader));

        Ok(store)
    }

    /// Open a private in-memory vault.
    pub fn open_in_memory(master_key: Arc<MasterKey>) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, master_key)
    }

    fn from_connection(conn: Connection, master_key: Arc<MasterKey>) -> Result<Self> {
        schema::apply(&conn)?;
        tracing::debug!("vault schema ready");

        Ok(Self {
            conn: Mutex::new(conn),
            reader: None,
            master_key,
        })
    }

    // ------------------------------------------------------------------
    // Lifecycle operations
    // ------------------------------------------------------------------

    /// Register a credential under `key_name`.
    ///
    /// If an active record already exists for `key_name`, its ciphertext
    /// is replaced in place (rotation) and its default flag is left alone.
    /// Otherwise a new record is inserted, and it becomes the default only
    /// if no record of any state has ever existed for `key_name`.
    pub fn register(
        &self,
        key_name: &str,
        plaintext: &str,
        details: &SecretDetails,
    ) -> Result<SecretRecord> {
        validate_key_name(key_name)?;
        validate_plaintext(plaintext)?;
        details.validate()?;

        let cipher_text = encrypt(&self.master_key, plaintext)?.to_string();

        self.write(|tx| {
            let now = schema::now();
            let existing = tx
                .query_row(
                    &format!(
                        "SELECT {RECORD_COLUMNS} FROM api_secrets
                         WHERE key_name = ?1 AND is_active = 1
                         ORDER BY is_default DESC, created_at ASC, rowid ASC
                         LIMIT 1"
                    ),
                    params![key_name],
                    record_from_row,
                )
                .optional()?;

            if let Some(mut record) = existing {
                tx.execute(
                    "UPDATE api_secrets SET cipher_text = ?1, is_active = 1, updated_at = ?2
                     WHERE id = ?3",
                    params![cipher_text, format_timestamp(now), record.id],
                )?;
                record.cipher_text = cipher_text.clone();
                record.updated_at = now;

                audit::record(
                    tx,
                    &AuditEvent {
                        operation: "rotate",
                        key_name,
                        record_id: &record.id,
                        actor: details.created_by.as_deref(),
                        details: None,
                    },
                )?;
                tracing::info!(record_id = %record.id, key_name, "rotated secret");
                return Ok(record);
            }

            let any_record: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM api_secrets WHERE key_name = ?1)",
                params![key_name],
                |row| row.get(0),
            )?;

            let record = new_record(key_name, &cipher_text, details, !any_record, now);
            insert_record(tx, &record)?;

            audit::record(
                tx,
                &AuditEvent {
                    operation: "register",
                    key_name,
                    record_id: &record.id,
                    actor: details.created_by.as_deref(),
                    details: record.is_default.then_some("default"),
                },
            )?;
            tracing::info!(
                record_id = %record.id,
                key_name,
                is_default = record.is_default,
                "registered secret"
            );
            Ok(record)
        })
    }

    /// Insert an additional active record under `key_name`, even when an
    /// active one already exists (e.g. a second provider account).
    ///
    /// The new record becomes the default only if `key_name` has no active
    /// default right now.
    pub fn add(
        &self,
        key_name: &str,
        plaintext: &str,
        details: &SecretDetails,
    ) -> Result<SecretRecord> {
        validate_key_name(key_name)?;
        validate_plaintext(plaintext)?;
        details.validate()?;

        let cipher_text = encrypt(&self.master_key, plaintext)?.to_string();

        self.write(|tx| {
            let has_default: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM api_secrets
                               WHERE key_name = ?1 AND is_active = 1 AND is_default = 1)",
                params![key_name],
                |row| row.get(0),
            )?;

            let record = new_record(key_name, &cipher_text, details, !has_default, schema::now());
            insert_record(tx, &record)?;

            audit::record(
                tx,
                &AuditEvent {
                    operation: "add",
                    key_name,
                    record_id: &record.id,
                    actor: details.created_by.as_deref(),
                    details: record.is_default.then_some("default"),
                },
            )?;
            tracing::info!(
                record_id = %record.id,
                key_name,
                is_default = record.is_default,
                "added secret"
            );
            Ok(record)
        })
    }

    /// Decrypt the record `record_id` for use.
    ///
    /// Decryption failures are returned as-is (`Integrity` or
    /// `MalformedCiphertext`), never folded into `NotFound`.
    pub fn reveal(&self, record_id: &str) -> Result<String> {
        let row: Option<(String, String, bool)> = {
            let conn = self.read_lock();
            conn.query_row(
                "SELECT key_name, cipher_text, is_active FROM api_secrets WHERE id = ?1",
                params![record_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?
        };

        let (key_name, cipher_text, is_active) =
            row.ok_or_else(|| VaultError::NotFound(record_id.to_string()))?;
        if !is_active {
            return Err(VaultError::InactiveSecret(record_id.to_string()));
        }

        self.decrypt_record(record_id, &key_name, &cipher_text)
    }

    /// Decrypt the active default record for `key_name`.
    pub fn reveal_default(&self, key_name: &str) -> Result<String> {
        validate_key_name(key_name)?;

        let row: Option<(String, String)> = {
            let conn = self.read_lock();
            conn.query_row(
                "SELECT id, cipher_text FROM api_secrets
                 WHERE key_name = ?1 AND is_active = 1 AND is_default = 1",
                params![key_name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
        };

        let (record_id, cipher_text) =
            row.ok_or_else(|| VaultError::NoDefault(key_name.to_string()))?;
        self.decrypt_record(&record_id, key_name, &cipher_text)
    }

    /// Deactivate a record.
    ///
    /// A default record loses its flag and no other record is promoted;
    /// callers must designate a new default explicitly.  Deactivating an
    /// already inactive record changes nothing.
    pub fn deactivate(&self, record_id: &str) -> Result<SecretMetadata> {
        self.write(|tx| {
            let mut record = load_record(tx, record_id)?;
            if !record.is_active {
                tracing::debug!(record_id, "secret already inactive");
                return Ok(record.metadata());
            }

            let was_default = record.is_default;
            let now = schema::now();
            tx.execute(
                "UPDATE api_secrets SET is_active = 0, is_default = 0, updated_at = ?1
                 WHERE id = ?2",
                params![format_timestamp(now), record_id],
            )?;
            record.is_active = false;
            record.is_default = false;
            record.updated_at = now;

            audit::record(
                tx,
                &AuditEvent {
                    operation: "deactivate",
                    key_name: &record.key_name,
                    record_id,
                    actor: None,
                    details: was_default.then_some("default cleared"),
                },
            )?;
            tracing::info!(record_id, key_name = %record.key_name, was_default, "deactivated secret");
            Ok(record.metadata())
        })
    }

    /// Make `record_id` the default for its key name.
    ///
    /// Clearing the previous default and setting the new one happen in one
    /// transaction, so no reader ever sees two defaults or a gap.
    pub fn set_default(&self, record_id: &str) -> Result<SecretMetadata> {
        self.write(|tx| {
            let mut record = load_record(tx, record_id)?;
            if !record.is_active {
                return Err(VaultError::InactiveSecret(record_id.to_string()));
            }
            if record.is_default {
                return Ok(record.metadata());
            }

            let now = format_timestamp(schema::now());
            let cleared = tx.execute(
                "UPDATE api_secrets SET is_default = 0, updated_at = ?1
                 WHERE key_name = ?2 AND is_default = 1 AND id != ?3",
                params![now, record.key_name, record_id],
            )?;
            tx.execute(
                "UPDATE api_secrets SET is_default = 1, updated_at = ?1 WHERE id = ?2",
                params![now, record_id],
            )?;

            audit::record(
                tx,
                &AuditEvent {
                    operation: "set-default",
                    key_name: &record.key_name,
                    record_id,
                    actor: None,
                    details: (cleared > 0).then_some("previous default cleared"),
                },
            )?;
            tracing::info!(record_id, key_name = %record.key_name, "default secret changed");

            record = load_record(tx, record_id)?;
            Ok(record.metadata())
        })
    }

    /// Replace the descriptive metadata of a record.  `created_by` is
    /// fixed at creation and is not changed.
    pub fn update_details(&self, record_id: &str, details: &SecretDetails) -> Result<SecretMetadata> {
        details.validate()?;

        self.write(|tx| {
            let record = load_record(tx, record_id)?;
            tx.execute(
                "UPDATE api_secrets
                 SET service_name = ?1, key_label = ?2, key_type = ?3, description = ?4,
                     docs_url = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    details.service_name,
                    details.key_label,
                    details.key_type,
                    details.description,
                    details.docs_url,
                    format_timestamp(schema::now()),
                    record_id
                ],
            )?;

            audit::record(
                tx,
                &AuditEvent {
                    operation: "update",
                    key_name: &record.key_name,
                    record_id,
                    actor: details.created_by.as_deref(),
                    details: None,
                },
            )?;
            tracing::info!(record_id, key_name = %record.key_name, "updated secret details");

            Ok(load_record(tx, record_id)?.metadata())
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Metadata for one record.
    pub fn get(&self, record_id: &str) -> Result<SecretMetadata> {
        let conn = self.read_lock();
        Ok(load_record(&conn, record_id)?.metadata())
    }

    /// Metadata for every record under `key_name`, active or not, oldest
    /// first.
    pub fn list_by_key_name(&self, key_name: &str) -> Result<Vec<SecretMetadata>> {
        validate_key_name(key_name)?;

        let conn = self.read_lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM api_secrets
             WHERE key_name = ?1
             ORDER BY created_at ASC, rowid ASC"
        ))?;

        let rows = stmt.query_map(params![key_name], record_from_row)?;
        let mut list = Vec::new();
        for row in rows {
            list.push(row?.metadata());
        }
        Ok(list)
    }

    /// All distinct key names, sorted.
    pub fn key_names(&self) -> Result<Vec<String>> {
        let conn = self.read_lock();
        let mut stmt =
            conn.prepare("SELECT DISTINCT key_name FROM api_secrets ORDER BY key_name ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    /// Recent audit entries, newest first.
    pub fn audit_entries(
        &self,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<AuditEntry>> {
        let conn = self.read_lock();
        audit::query(&conn, limit, since)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// A poisoned lock still guards a consistent connection: any open
    /// transaction was rolled back when its guard dropped.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_lock(&self) -> MutexGuard<'_, Connection> {
        match &self.reader {
            Some(reader) => reader.lock().unwrap_or_else(PoisonError::into_inner),
            None => self.lock(),
        }
    }

    /// Run `op` inside an `IMMEDIATE` transaction, retrying when it trips
    /// a uniqueness constraint.
    fn write<T, F>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(&Transaction<'_>) -> Result<T>,
    {
        let mut attempt = 1;
        loop {
            let mut conn = self.lock();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            match op(&tx) {
                Ok(value) => {
                    tx.commit()?;
                    return Ok(value);
                }
                Err(e) if is_constraint_violation(&e) && attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!(attempt, "write conflicted on a uniqueness constraint, retrying");
                    drop(tx);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn decrypt_record(&self, record_id: &str, key_name: &str, cipher_text: &str) -> Result<String> {
        let plaintext = decrypt(&self.master_key, cipher_text).map_err(|e| {
            if e.is_security_event() {
                tracing::warn!(record_id, key_name, error = %e, "secret failed to decrypt");
            }
            e
        })?;
        tracing::debug!(record_id, key_name, "revealed secret");
        Ok(plaintext)
    }
}

/// Plaintext credentials must be non-empty.
fn validate_plaintext(plaintext: &str) -> Result<()> {
    if plaintext.is_empty() {
        return Err(VaultError::Validation("secret value cannot be empty".into()));
    }
    Ok(())
}

fn is_constraint_violation(err: &VaultError) -> bool {
    matches!(
        err,
        VaultError::Database(e) if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation)
    )
}

fn new_record(
    key_name: &str,
    cipher_text: &str,
    details: &SecretDetails,
    is_default: bool,
    now: DateTime<Utc>,
) -> SecretRecord {
    SecretRecord {
        id: Uuid::new_v4().to_string(),
        key_name: key_name.to_string(),
        cipher_text: cipher_text.to_string(),
        service_name: details.service_name.clone(),
        key_label: details.key_label.clone(),
        key_type: details.key_type.clone(),
        description: details.description.clone(),
        docs_url: details.docs_url.clone(),
        is_active: true,
        is_default,
        created_by: details.created_by.clone(),
        created_at: now,
        updated_at: now,
    }
}

fn insert_record(conn: &Connection, record: &SecretRecord) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO api_secrets ({RECORD_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        ),
        params![
            record.id,
            record.key_name,
            record.cipher_text,
            record.service_name,
            record.key_label,
            record.key_type,
            record.description,
            record.docs_url,
            record.is_active,
            record.is_default,
            record.created_by,
            format_timestamp(record.created_at),
            format_timestamp(record.updated_at)
        ],
    )?;
    Ok(())
}

fn load_record(conn: &Connection, record_id: &str) -> Result<SecretRecord> {
    conn.query_row(
        &format!("SELECT {RECORD_COLUMNS} FROM api_secrets WHERE id = ?1"),
        params![record_id],
        record_from_row,
    )
    .optional()?
    .ok_or_else(|| VaultError::NotFound(record_id.to_string()))
}
