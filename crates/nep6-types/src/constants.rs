//! NEO address, script, and contract-parameter constants.
//!
//! Reference: neo/SmartContract/Contract.cs, ContractParameterType.cs

use serde::{Deserialize, Serialize};

// =============================================================================
// Addresses
// =============================================================================

/// Address version byte prepended to the script hash before base58check.
pub const ADDRESS_VERSION: u8 = 0x17;

/// Size of a script hash (RIPEMD-160 output) in bytes.
pub const SCRIPT_HASH_SIZE: usize = 20;

/// Size of the base58check checksum in bytes.
pub const CHECKSUM_SIZE: usize = 4;

/// Decoded address payload size: version byte + script hash.
pub const ADDRESS_PAYLOAD_SIZE: usize = 1 + SCRIPT_HASH_SIZE;

// =============================================================================
// Keys and Scripts
// =============================================================================

/// Size of a private key in bytes.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of a compressed secp256r1 public key in bytes.
pub const COMPRESSED_PUBKEY_SIZE: usize = 33;

/// PUSHBYTES33 opcode: pushes the following 33-byte public key.
pub const OP_PUSHBYTES33: u8 = 0x21;

/// CHECKSIG opcode.
pub const OP_CHECKSIG: u8 = 0xAC;

/// Length of a standard single-signature verification script.
pub const SIGNATURE_SCRIPT_SIZE: usize = 1 + COMPRESSED_PUBKEY_SIZE + 1;

// =============================================================================
// Contract Parameter Types
// =============================================================================

/// Kind of a contract parameter.
///
/// Serialized by variant name, e.g. `"Signature"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ContractParameterType {
    Signature        = 0x00,
    Boolean          = 0x01,
    Integer          = 0x02,
    Hash160          = 0x03,
    Hash256          = 0x04,
    ByteArray        = 0x05,
    PublicKey        = 0x06,
    String           = 0x07,
    Array            = 0x10,
    InteropInterface = 0xf0,
    Void             = 0xff,
}

impl ContractParameterType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x00 => Some(Self::Signature),
            0x01 => Some(Self::Boolean),
            0x02 => Some(Self::Integer),
            0x03 => Some(Self::Hash160),
            0x04 => Some(Self::Hash256),
            0x05 => Some(Self::ByteArray),
            0x06 => Some(Self::PublicKey),
            0x07 => Some(Self::String),
            0x10 => Some(Self::Array),
            0xf0 => Some(Self::InteropInterface),
            0xff => Some(Self::Void),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContractParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signature        => write!(f, "Signature"),
            Self::Boolean          => write!(f, "Boolean"),
            Self::Integer          => write!(f, "Integer"),
            Self::Hash160          => write!(f, "Hash160"),
            Self::Hash256          => write!(f, "Hash256"),
            Self::ByteArray        => write!(f, "ByteArray"),
            Self::PublicKey        => write!(f, "PublicKey"),
            Self::String           => write!(f, "String"),
            Self::Array            => write!(f, "Array"),
            Self::InteropInterface => write!(f, "InteropInterface"),
            Self::Void             => write!(f, "Void"),
        }
    }
}
