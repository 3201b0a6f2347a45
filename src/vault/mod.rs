//! Vault module — encrypted credential storage.
//!
//! This module provides:
//! - `SecretRecord`, `SecretMetadata` and `SecretDetails` types (`secret`)
//! - The SQLite schema and row mapping (`schema`)
//! - High-level `VaultStore` with the lifecycle and default rules (`store`)

pub mod schema;
pub mod secret;
pub mod store;

// Re-export the most commonly used items.
pub use secret::{validate_key_name, SecretDetails, SecretMetadata, SecretRecord};
pub use store::VaultStore;
