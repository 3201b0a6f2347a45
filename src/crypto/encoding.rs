//! Storage encoding for encrypted secret values.
//!
//! An encrypted value is stored as three lowercase hex fields joined by
//! colons, in a fixed order:
//!
//! ```text
//! <iv hex (32 chars)>:<auth tag hex (32 chars)>:<ciphertext hex>
//! ```
//!
//! Parsing accepts exactly three fields.  A later format revision can add
//! a leading version field without breaking records written today.

use std::fmt;
use std::str::FromStr;

use crate::errors::VaultError;

/// Size of the AES-GCM initialization vector in bytes.
pub const IV_LEN: usize = 16;

/// Size of the AES-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Field separator in the encoded form.
pub const DELIMITER: char = ':';

/// A parsed encrypted value: IV, tag and ciphertext bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedCipherText {
    pub iv: [u8; IV_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl fmt::Display for EncodedCipherText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            hex::encode(self.iv),
            hex::encode(self.tag),
            hex::encode(&self.ciphertext)
        )
    }
}

impl fmt::Debug for EncodedCipherText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedCipherText")
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

impl FromStr for EncodedCipherText {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(DELIMITER).collect();
        let [iv, tag, ciphertext] = fields.as_slice() else {
            return Err(VaultError::MalformedCiphertext(format!(
                "expected 3 colon-delimited fields, found {}",
                fields.len()
            )));
        };

        Ok(Self {
            iv: decode_fixed("iv", iv)?,
            tag: decode_fixed("auth tag", tag)?,
            ciphertext: decode_field("ciphertext", ciphertext)?,
        })
    }
}

/// Decode one lowercase hex field.
fn decode_field(name: &str, field: &str) -> Result<Vec<u8>, VaultError> {
    if field.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(VaultError::MalformedCiphertext(format!(
            "{name} field must be lowercase hex"
        )));
    }
    hex::decode(field)
        .map_err(|e| VaultError::MalformedCiphertext(format!("{name} field is not valid hex: {e}")))
}

/// Decode a hex field that must be exactly `N` bytes long.
fn decode_fixed<const N: usize>(name: &str, field: &str) -> Result<[u8; N], VaultError> {
    let bytes = decode_field(name, field)?;
    bytes.as_slice().try_into().map_err(|_| {
        VaultError::MalformedCiphertext(format!(
            "{name} field must be {N} bytes, found {}",
            bytes.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EncodedCipherText {
        EncodedCipherText {
            iv: [0x01; IV_LEN],
            tag: [0xfe; TAG_LEN],
            ciphertext: vec![0xde, 0xad, 0xbe, 0xef],
        }
    }

    #[test]
    fn display_uses_fixed_field_order() {
        let encoded = sample().to_string();
        assert_eq!(
            encoded,
            format!("{}:{}:deadbeef", "01".repeat(16), "fe".repeat(16))
        );
    }

    #[test]
    fn parses_what_it_prints() {
        let parsed: EncodedCipherText = sample().to_string().parse().unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn empty_ciphertext_field_is_allowed() {
        let encoded = format!("{}:{}:", "00".repeat(16), "00".repeat(16));
        let parsed: EncodedCipherText = encoded.parse().unwrap();
        assert!(parsed.ciphertext.is_empty());
    }

    #[test]
    fn rejects_wrong_field_count() {
        for input in ["", "abcd", "aa:bb", "aa:bb:cc:dd"] {
            assert!(
                matches!(
                    input.parse::<EncodedCipherText>(),
                    Err(VaultError::MalformedCiphertext(_))
                ),
                "input {input:?} should be malformed"
            );
        }
    }

    #[test]
    fn rejects_short_iv() {
        let encoded = format!("{}:{}:00", "00".repeat(12), "00".repeat(16));
        assert!(matches!(
            encoded.parse::<EncodedCipherText>(),
            Err(VaultError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn rejects_invalid_hex() {
        let encoded = format!("{}:{}:zz", "00".repeat(16), "00".repeat(16));
        assert!(matches!(
            encoded.parse::<EncodedCipherText>(),
            Err(VaultError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn rejects_uppercase_hex() {
        let encoded = format!("{}:{}:AB", "00".repeat(16), "00".repeat(16));
        assert!(matches!(
            encoded.parse::<EncodedCipherText>(),
            Err(VaultError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn debug_does_not_print_bytes() {
        let shown = format!("{:?}", sample());
        assert!(!shown.contains("deadbeef"));
    }
}
