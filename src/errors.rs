use thiserror::Error;

/// All errors that can occur in the vault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Startup errors ---
    #[error("Configuration error: {0}")]
    Configuration(String),

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    #[error("Integrity check failed — wrong key, corrupted record, or tampering")]
    Integrity,

    // --- Lifecycle errors ---
    #[error("Secret '{0}' not found")]
    NotFound(String),

    #[error("Secret '{0}' is inactive")]
    InactiveSecret(String),

    #[error("No default secret designated for '{0}'")]
    NoDefault(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    // --- Storage errors ---
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl VaultError {
    /// Returns `true` for failures that point at a wrong key, a corrupted
    /// record, or tampering. Callers should log these as security events
    /// rather than ordinary lookup misses.
    pub fn is_security_event(&self) -> bool {
        matches!(self, Self::Integrity | Self::MalformedCiphertext(_))
    }
}

/// Convenience type alias for vault results.
pub type Result<T> = std::result::Result<T, VaultError>;
