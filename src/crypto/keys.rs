//! Master key loading.
//!
//! The vault runs on a single long-lived 256-bit master key supplied as
//! 64 hex characters through configuration (normally an environment
//! variable).  The key is validated once at startup and then shared
//! read-only with every store in the process.

use std::fmt;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use zeroize::Zeroize;

use crate::errors::{Result, VaultError};

/// Length of the master key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// A wrapper around the 32-byte master key that automatically zeroes
/// its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Generate a fresh random key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        let key = Self::new(bytes);
        bytes.zeroize();
        key
    }

    /// Decode and validate a hex-encoded master key.
    ///
    /// `None`, an empty string, invalid hex, or a decoded length other
    /// than 32 bytes are all configuration errors.  The offending value
    /// is never echoed back in the error message.
    pub fn from_hex(value: Option<&str>) -> Result<Self> {
        let value = value.map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return Err(VaultError::Configuration(
                "master key is not set".to_string(),
            ));
        }

        let mut decoded = hex::decode(value).map_err(|_| {
            VaultError::Configuration("master key is not valid hexadecimal".to_string())
        })?;

        if decoded.len() != KEY_LEN {
            let found = decoded.len();
            decoded.zeroize();
            return Err(VaultError::Configuration(format!(
                "master key must decode to {KEY_LEN} bytes, found {found}"
            )));
        }

        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();

        let key = Self::new(bytes);
        bytes.zeroize();
        Ok(key)
    }

    /// Load the master key from the environment variable `var`.
    pub fn from_env(var: &str) -> Result<Self> {
        match std::env::var(var) {
            Ok(mut value) => {
                let key = Self::from_hex(Some(&value));
                value.zeroize();
                key.map_err(|e| match e {
                    VaultError::Configuration(msg) => {
                        VaultError::Configuration(format!("{var}: {msg}"))
                    }
                    other => other,
                })
            }
            Err(_) => Err(VaultError::Configuration(format!(
                "{var} is not set — provide the master key as 64 hex characters"
            ))),
        }
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Lowercase hex encoding of the key, for one-time display by `keygen`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}
