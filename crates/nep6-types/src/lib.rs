//! Core types and constants for NEP-6 keystores.
//!
//! This crate provides the foundational types used across the nep6 crates:
//! script hashes, verification scripts, address encoding/decoding,
//! Base58Check, and contract parameter kinds.

pub mod address;
pub mod base58;
pub mod constants;
pub mod script;

pub use address::{from_address, to_address, AddressError};
pub use constants::ContractParameterType;
pub use script::{ScriptHash, ScriptHashError};
