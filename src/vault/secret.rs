//! Secret record types stored in the vault.
//!
//! `SecretRecord` is the full stored row including the encoded
//! ciphertext.  `SecretMetadata` is the same row without the ciphertext
//! and is the only shape handed out by listing operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// Maximum length of a key name in bytes.
const MAX_KEY_NAME_LEN: usize = 256;

/// A single stored credential.
#[derive(Clone, Serialize)]
pub struct SecretRecord {
    /// Unique identifier, assigned at creation.
    pub id: String,

    /// Logical credential name (e.g. "GEMINI_API_KEY"). Not unique alone.
    pub key_name: String,

    /// The encoded `<iv>:<tag>:<ciphertext>` value.
    #[serde(skip_serializing)]
    pub cipher_text: String,

    pub service_name: Option<String>,
    pub key_label: Option<String>,
    pub key_type: Option<String>,
    pub description: Option<String>,
    pub docs_url: Option<String>,

    /// Inactive records are kept for audit but never decrypted.
    pub is_active: bool,

    /// At most one active record per `key_name` carries this flag.
    pub is_default: bool,

    /// Administrator who created the record; `None` for system origin.
    pub created_by: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SecretRecord {
    /// Strip the ciphertext.
    pub fn metadata(&self) -> SecretMetadata {
        SecretMetadata {
            id: self.id.clone(),
            key_name: self.key_name.clone(),
            service_name: self.service_name.clone(),
            key_label: self.key_label.clone(),
            key_type: self.key_type.clone(),
            description: self.description.clone(),
            docs_url: self.docs_url.clone(),
            is_active: self.is_active,
            is_default: self.is_default,
            created_by: self.created_by.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl std::fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretRecord")
            .field("id", &self.id)
            .field("key_name", &self.key_name)
            .field("is_active", &self.is_active)
            .field("is_default", &self.is_default)
            .finish_non_exhaustive()
    }
}

/// Record metadata without the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretMetadata {
    pub id: String,
    pub key_name: String,
    pub service_name: Option<String>,
    pub key_label: Option<String>,
    pub key_type: Option<String>,
    pub description: Option<String>,
    pub docs_url: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied descriptive metadata for a credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDetails {
    pub service_name: Option<String>,
    pub key_label: Option<String>,
    pub key_type: Option<String>,
    pub description: Option<String>,
    pub docs_url: Option<String>,
    pub created_by: Option<String>,
}

impl SecretDetails {
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.docs_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(VaultError::Validation(format!(
                    "docs URL '{url}' must start with http:// or https://"
                )));
            }
        }
        Ok(())
    }
}

/// Validate that a key name is safe.
///
/// Allowed: ASCII letters, digits, underscores, hyphens, periods.
/// Must be non-empty and at most 256 characters.
pub fn validate_key_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(VaultError::Validation("key name cannot be empty".into()));
    }
    if name.len() > MAX_KEY_NAME_LEN {
        return Err(VaultError::Validation(format!(
            "key name cannot exceed {MAX_KEY_NAME_LEN} characters"
        )));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
    {
        return Err(VaultError::Validation(format!(
            "key name '{name}' contains invalid characters — only ASCII letters, digits, underscores, hyphens, and periods are allowed"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_key_names() {
        assert!(validate_key_name("GEMINI_API_KEY").is_ok());
        assert!(validate_key_name("stripe.secret-key").is_ok());
        assert!(validate_key_name("a").is_ok());
    }

    #[test]
    fn rejects_bad_key_names() {
        assert!(validate_key_name("").is_err());
        assert!(validate_key_name("HAS SPACE").is_err());
        assert!(validate_key_name("slash/name").is_err());
        assert!(validate_key_name(&"K".repeat(257)).is_err());
    }

    #[test]
    fn docs_url_must_be_http() {
        let mut details = SecretDetails {
            docs_url: Some("https://ai.google.dev/gemini-api/docs".into()),
            ..SecretDetails::default()
        };
        assert!(details.validate().is_ok());

        details.docs_url = Some("javascript:alert(1)".into());
        assert!(matches!(details.validate(), Err(VaultError::Validation(_))));
    }

    #[test]
    fn debug_hides_ciphertext() {
        let now = Utc::now();
        let record = SecretRecord {
            id: "id-1".into(),
            key_name: "KEY".into(),
            cipher_text: "aa:bb:cc".into(),
            service_name: None,
            key_label: None,
            key_type: None,
            description: None,
            docs_url: None,
            is_active: true,
            is_default: true,
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        assert!(!format!("{record:?}").contains("aa:bb:cc"));
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("aa:bb:cc"));
    }
}
