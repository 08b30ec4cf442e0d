//! NEP-6 keystore.
//!
//! Manages accounts whose private keys are stored NEP-2 encrypted, unlock
//! sessions that hold the password and decrypted keys, JSON persistence, and
//! migration from legacy wallet containers.

pub mod account;
pub mod error;
mod file;
pub mod keystore;
pub mod migrate;
pub mod session;

pub use account::{Account, Contract, ContractKind, ContractParameter};
pub use error::KeystoreError;
pub use keystore::{Keystore, KEYSTORE_VERSION};
pub use migrate::{LegacyAccount, LegacyWallet};
pub use session::UnlockSession;

pub use nep6_crypto::{EncryptedKey, KeyPair, ScryptParameters};
pub use nep6_types::{ContractParameterType, ScriptHash};
