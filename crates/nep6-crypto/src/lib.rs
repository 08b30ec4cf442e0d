//! Cryptographic primitives for NEP-6 keystores.
//!
//! - [`keys`]: secp256r1 key pairs, WIF, certificate import, signing
//! - [`scrypt`]: validated scrypt cost parameters
//! - [`nep2`]: password-encrypted private keys

pub mod keys;
pub mod nep2;
pub mod scrypt;

pub use keys::{verify_signature, KeyError, KeyPair};
pub use nep2::{EncryptedKey, Nep2Error};
pub use scrypt::{ScryptError, ScryptParameters};
