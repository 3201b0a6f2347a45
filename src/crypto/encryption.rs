//! AES-256-GCM authenticated encryption of secret values.
//!
//! Each call to `encrypt` generates a fresh random 16-byte IV.  The tag
//! is kept detached from the ciphertext so the three parts can be stored
//! in the `<iv>:<tag>:<ciphertext>` form described in `encoding`.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::OsRng;
use aes_gcm::aes::Aes256;
use aes_gcm::{AeadCore, AeadInPlace, AesGcm, KeyInit, Nonce, Tag};
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{Result, VaultError};

use super::encoding::{EncodedCipherText, IV_LEN, TAG_LEN};
use super::keys::MasterKey;

/// AES-256-GCM with a 128-bit IV and a 128-bit tag.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Encrypt `plaintext` under `key`.
pub fn encrypt(key: &MasterKey, plaintext: &str) -> Result<EncodedCipherText> {
    let cipher = Aes256Gcm16::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let iv = Aes256Gcm16::generate_nonce(&mut OsRng);

    // Encrypted in place: the buffer holds plaintext until the call returns.
    let mut buffer = Zeroizing::new(plaintext.as_bytes().to_vec());
    let tag = cipher
        .encrypt_in_place_detached(&iv, b"", &mut *buffer)
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut iv_bytes = [0u8; IV_LEN];
    iv_bytes.copy_from_slice(&iv);
    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(&tag);

    Ok(EncodedCipherText {
        iv: iv_bytes,
        tag: tag_bytes,
        ciphertext: std::mem::take(&mut *buffer),
    })
}

/// Parse an encoded value and decrypt it under `key`.
///
/// Fails with `MalformedCiphertext` when the encoding is wrong and with
/// `Integrity` when the authentication tag does not verify.
pub fn decrypt(key: &MasterKey, encoded: &str) -> Result<String> {
    let parsed: EncodedCipherText = encoded.parse()?;
    decrypt_parts(key, parsed)
}

/// Decrypt an already-parsed value.
pub fn decrypt_parts(key: &MasterKey, encoded: EncodedCipherText) -> Result<String> {
    let cipher = Aes256Gcm16::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let mut buffer = Zeroizing::new(encoded.ciphertext);
    cipher
        .decrypt_in_place_detached(
            Nonce::<U16>::from_slice(&encoded.iv),
            b"",
            &mut *buffer,
            Tag::<U16>::from_slice(&encoded.tag),
        )
        .map_err(|_| VaultError::Integrity)?;

    String::from_utf8(std::mem::take(&mut *buffer)).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        VaultError::MalformedCiphertext("decrypted value is not valid UTF-8".to_string())
    })
}
