//! Base58Check encoding/decoding.
//!
//! Bitcoin-style Base58 with a 4-byte double-SHA256 checksum appended to the
//! payload. Used for addresses, WIF keys, and NEP-2 encrypted keys.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Base58Error {
    #[error("invalid character '{0}' at position {1}")]
    InvalidCharacter(char, usize),

    #[error("non-ASCII character at position {0}")]
    NonAscii(usize),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("input too short to carry a checksum")]
    NoChecksum,

    #[error("base58 decode failed: {0}")]
    Other(String),
}

impl From<bs58::decode::Error> for Base58Error {
    fn from(e: bs58::decode::Error) -> Self {
        match e {
            bs58::decode::Error::InvalidCharacter { character, index } => {
                Self::InvalidCharacter(character, index)
            }
            bs58::decode::Error::NonAsciiCharacter { index } => Self::NonAscii(index),
            bs58::decode::Error::InvalidChecksum { .. } => Self::ChecksumMismatch,
            bs58::decode::Error::NoChecksum => Self::NoChecksum,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Encode a payload with an appended double-SHA256 checksum.
pub fn encode_check(data: &[u8]) -> String {
    bs58::encode(data).with_check().into_string()
}

/// Decode a Base58Check string, verifying and stripping the checksum.
pub fn decode_check(encoded: &str) -> Result<Vec<u8>, Base58Error> {
    Ok(bs58::decode(encoded).with_check(None).into_vec()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_roundtrip() {
        let data = (0..39u8).collect::<Vec<_>>();
        let encoded = encode_check(&data);
        assert_eq!(decode_check(&encoded).unwrap(), data);
    }

    #[test]
    fn test_leading_zeros_preserved() {
        let data = vec![0u8, 0, 1, 2];
        let encoded = encode_check(&data);
        assert!(encoded.starts_with("11"));
        assert_eq!(decode_check(&encoded).unwrap(), data);
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut encoded = encode_check(&[0xAB; 21]);
        let last = encoded.pop().unwrap();
        encoded.push(if last == '1' { '2' } else { '1' });
        assert_eq!(decode_check(&encoded), Err(Base58Error::ChecksumMismatch));
    }

    #[test]
    fn test_invalid_character() {
        // '0' is not in the Base58 alphabet.
        let result = decode_check("1110");
        assert!(matches!(result, Err(Base58Error::InvalidCharacter('0', 3))));
    }

    #[test]
    fn test_too_short() {
        assert!(decode_check("1").is_err());
    }
}
