//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::MasterKey;
use crate::errors::{Result, VaultError};
use crate::vault::{SecretDetails, SecretMetadata, VaultStore};

/// apivault CLI: encrypted storage for third-party API credentials.
#[derive(Parser)]
#[command(
    name = "apivault",
    about = "Encrypted storage for third-party API credentials",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the vault database (default: from .apivault.toml)
    #[arg(long, env = "APIVAULT_DB", global = true)]
    pub db: Option<String>,

    /// Environment variable that holds the master key (default: ENCRYPTION_KEY)
    #[arg(long, global = true)]
    pub key_env: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Register a credential (rotates the active record if one exists)
    Register {
        /// Key name (e.g. GEMINI_API_KEY)
        key_name: String,
        /// Secret value (omit for interactive prompt)
        value: Option<String>,
        #[command(flatten)]
        details: DetailsArgs,
    },

    /// Add another active credential under an existing key name
    Add {
        /// Key name (e.g. GEMINI_API_KEY)
        key_name: String,
        /// Secret value (omit for interactive prompt)
        value: Option<String>,
        #[command(flatten)]
        details: DetailsArgs,
    },

    /// Print the decrypted value of a record
    Reveal {
        /// Record id
        id: String,
    },

    /// Print the decrypted value of the default record for a key name
    RevealDefault {
        /// Key name
        key_name: String,
    },

    /// Deactivate a record (kept for audit, never decrypted again)
    Deactivate {
        /// Record id
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Make a record the default for its key name
    SetDefault {
        /// Record id
        id: String,
    },

    /// Change the descriptive metadata of a record (omitted flags keep their value)
    Update {
        /// Record id
        id: String,
        #[command(flatten)]
        details: DetailsArgs,
    },

    /// List records (metadata only)
    List {
        /// Only list records for this key name
        key_name: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// View the audit log of vault mutations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate a new random master key
    Keygen,
}

/// Descriptive metadata flags shared by `register`, `add` and `update`.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct DetailsArgs {
    /// Provider or service name (e.g. gemini)
    #[arg(long)]
    pub service: Option<String>,
    /// Human-readable label
    #[arg(long)]
    pub label: Option<String>,
    /// Credential type (e.g. api_key, oauth_secret)
    #[arg(long = "type")]
    pub key_type: Option<String>,
    /// Free-form description
    #[arg(long)]
    pub description: Option<String>,
    /// Link to the provider's key documentation
    #[arg(long)]
    pub docs_url: Option<String>,
    /// Administrator performing the change
    #[arg(long)]
    pub created_by: Option<String>,
}

impl DetailsArgs {
    pub fn to_details(&self) -> SecretDetails {
        SecretDetails {
            service_name: self.service.clone(),
            key_label: self.label.clone(),
            key_type: self.key_type.clone(),
            description: self.description.clone(),
            docs_url: self.docs_url.clone(),
            created_by: self.created_by.clone(),
        }
    }

    /// Details for an update: flags given on the command line win, the
    /// rest are taken from `current`.
    pub fn merged_onto(&self, current: &SecretMetadata) -> SecretDetails {
        let pick = |flag: &Option<String>, stored: &Option<String>| {
            flag.clone().or_else(|| stored.clone())
        };
        SecretDetails {
            service_name: pick(&self.service, &current.service_name),
            key_label: pick(&self.label, &current.key_label),
            key_type: pick(&self.key_type, &current.key_type),
            description: pick(&self.description, &current.description),
            docs_url: pick(&self.docs_url, &current.docs_url),
            created_by: self.created_by.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load `.apivault.toml` from the current directory.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// Install the tracing subscriber.  `RUST_LOG` wins over `default_level`.
/// Logs go to stderr so they never mix with revealed values on stdout.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Resolve the database path from `--db` or the settings file.
pub fn database_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    match &cli.db {
        Some(path) => Ok(PathBuf::from(path)),
        None => {
            let cwd = std::env::current_dir()?;
            Ok(settings.database_path(&cwd))
        }
    }
}

/// Load the master key and open the vault.
///
/// A missing or malformed key stops here, before the database is touched.
pub fn open_store(cli: &Cli, settings: &Settings) -> Result<VaultStore> {
    let key_env = cli.key_env.as_deref().unwrap_or(&settings.master_key_env);
    let master_key = MasterKey::from_env(key_env)?;
    let path = database_path(cli, settings)?;
    VaultStore::open(&path, Arc::new(master_key))
}

/// Get a secret value, trying in order:
/// 1. The value given on the command line
/// 2. Piped stdin
/// 3. Interactive hidden prompt
///
/// Returns `Zeroizing<String>` so the value is wiped from memory on drop.
pub fn read_secret_value(key_name: &str, value: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(v) = value {
        output::warning("Value provided on command line — it may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut *buf)?;
        let trimmed = buf.trim_end().len();
        buf.truncate(trimmed);
        return Ok(buf);
    }

    let value = dialoguer::Password::new()
        .with_prompt(format!("Enter value for {key_name}"))
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}
