//! Cryptographic primitives for the vault.
//!
//! This module provides:
//! - Master key loading and validation (`keys`)
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - The `<iv>:<tag>:<ciphertext>` storage encoding (`encoding`)

pub mod encoding;
pub mod encryption;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, MasterKey};
pub use encoding::EncodedCipherText;
pub use encryption::{decrypt, encrypt};
pub use keys::MasterKey;
