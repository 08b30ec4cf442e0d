//! NEO address encoding, decoding, and validation.
//!
//! An address is `base58check(ADDRESS_VERSION || script_hash)`.

use crate::base58;
use crate::constants::{ADDRESS_PAYLOAD_SIZE, ADDRESS_VERSION};
use crate::script::ScriptHash;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must be a non-empty string")]
    Empty,

    #[error("base58 decode error: {0}")]
    Base58(#[from] base58::Base58Error),

    #[error("invalid address payload length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unknown address version: 0x{0:02x}")]
    UnknownVersion(u8),
}

/// Encode a script hash as an address string.
pub fn to_address(script_hash: &ScriptHash) -> String {
    let mut data = [0u8; ADDRESS_PAYLOAD_SIZE];
    data[0] = ADDRESS_VERSION;
    data[1..].copy_from_slice(script_hash.as_bytes());
    base58::encode_check(&data)
}

/// Decode an address string back to its script hash.
pub fn from_address(address: &str) -> Result<ScriptHash, AddressError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AddressError::Empty);
    }

    let data = base58::decode_check(address)?;
    if data.len() != ADDRESS_PAYLOAD_SIZE {
        return Err(AddressError::InvalidLength {
            expected: ADDRESS_PAYLOAD_SIZE,
            actual: data.len(),
        });
    }
    if data[0] != ADDRESS_VERSION {
        return Err(AddressError::UnknownVersion(data[0]));
    }

    let mut hash = [0u8; ADDRESS_PAYLOAD_SIZE - 1];
    hash.copy_from_slice(&data[1..]);
    Ok(ScriptHash::new(hash))
}

/// Validate an address string.
pub fn is_valid_address(address: &str) -> bool {
    from_address(address).is_ok()
}
