//! Script hashes and verification scripts.

use crate::constants::{
    COMPRESSED_PUBKEY_SIZE, OP_CHECKSIG, OP_PUSHBYTES33, SCRIPT_HASH_SIZE, SIGNATURE_SCRIPT_SIZE,
};
use ripemd::Ripemd160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptHashError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("script hash must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 applied twice.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(Sha256::digest(data)).into()
}

/// RIPEMD-160 of SHA-256.
pub fn hash160(data: &[u8]) -> [u8; SCRIPT_HASH_SIZE] {
    Ripemd160::digest(Sha256::digest(data)).into()
}

/// 160-bit script hash identifying an account.
///
/// Bytes are kept in storage order (the raw hash output). The textual form
/// is `0x` followed by the byte-reversed hex, matching how NEO displays
/// `UInt160` values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ScriptHash([u8; SCRIPT_HASH_SIZE]);

impl ScriptHash {
    pub const fn new(bytes: [u8; SCRIPT_HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Hash a verification script.
    pub fn from_script(script: &[u8]) -> Self {
        Self(hash160(script))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ScriptHashError> {
        let arr: [u8; SCRIPT_HASH_SIZE] =
            bytes.try_into().map_err(|_| ScriptHashError::InvalidLength {
                expected: SCRIPT_HASH_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SCRIPT_HASH_SIZE] {
        &self.0
    }
}

impl AsRef<[u8]> for ScriptHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in self.0.iter().rev() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptHash({})", self)
    }
}

impl FromStr for ScriptHash {
    type Err = ScriptHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = hex::decode(s).map_err(|e| ScriptHashError::InvalidHex(e.to_string()))?;
        bytes.reverse();
        Self::from_slice(&bytes)
    }
}

impl Serialize for ScriptHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScriptHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Build the standard single-signature verification script for a compressed
/// public key: `PUSHBYTES33 <pubkey> CHECKSIG`.
pub fn signature_redeem_script(pubkey: &[u8; COMPRESSED_PUBKEY_SIZE]) -> Vec<u8> {
    let mut script = Vec::with_capacity(SIGNATURE_SCRIPT_SIZE);
    script.push(OP_PUSHBYTES33);
    script.extend_from_slice(pubkey);
    script.push(OP_CHECKSIG);
    script
}

/// Whether a script has the standard single-signature shape.
pub fn is_signature_contract(script: &[u8]) -> bool {
    script.len() == SIGNATURE_SCRIPT_SIZE
        && script[0] == OP_PUSHBYTES33
        && script[SIGNATURE_SCRIPT_SIZE - 1] == OP_CHECKSIG
}
