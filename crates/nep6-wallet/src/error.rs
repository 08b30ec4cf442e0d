//! Keystore error types.

use nep6_crypto::{KeyError, Nep2Error};
use nep6_types::{AddressError, ScriptHash, ScriptHashError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeystoreError {
    /// Wrong password, or an encrypted key whose checksum does not match.
    #[error("invalid password")]
    InvalidPassword,

    #[error("corrupted keystore: {0}")]
    CorruptedKeystore(String),

    #[error("keystore is locked")]
    NotUnlocked,

    #[error("account not found: {0}")]
    AccountNotFound(ScriptHash),

    #[error("unsupported keystore version: {0}")]
    UnsupportedFormatVersion(String),

    #[error("keystore has no file path")]
    NoPath,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("key error: {0}")]
    Key(#[from] KeyError),
}

impl From<Nep2Error> for KeystoreError {
    fn from(e: Nep2Error) -> Self {
        match e {
            Nep2Error::InvalidPassword => Self::InvalidPassword,
            Nep2Error::Key(k) => Self::Key(k),
            Nep2Error::Malformed(_) | Nep2Error::Scrypt(_) => Self::CorruptedKeystore(e.to_string()),
        }
    }
}

impl From<AddressError> for KeystoreError {
    fn from(e: AddressError) -> Self {
        Self::CorruptedKeystore(e.to_string())
    }
}

impl From<ScriptHashError> for KeystoreError {
    fn from(e: ScriptHashError) -> Self {
        Self::CorruptedKeystore(e.to_string())
    }
}
