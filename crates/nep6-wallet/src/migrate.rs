//! Migration from older wallet containers.

use crate::account::Contract;
use crate::error::KeystoreError;
use crate::keystore::Keystore;
use log::info;
use nep6_crypto::KeyPair;
use std::path::{Path, PathBuf};

/// An account as exposed by a legacy container.
#[derive(Debug, Clone)]
pub struct LegacyAccount {
    pub contract: Contract,
    /// `None` when the legacy container has no recoverable key.
    pub key: Option<KeyPair>,
}

/// A wallet format that can be opened with a password and enumerated.
pub trait LegacyWallet: Sized {
    fn open(path: &Path, password: &str) -> Result<Self, KeystoreError>;

    fn name(&self) -> Option<String>;

    fn accounts(&self) -> Vec<LegacyAccount>;
}

impl Keystore {
    /// Build a new keystore at `path` from the legacy container at
    /// `legacy_path`. The legacy container comes first.
    ///
    /// Keys are re-encrypted under `password` with this keystore's scrypt
    /// parameters. The result is not saved.
    pub fn migrate<L: LegacyWallet>(
        legacy_path: impl AsRef<Path>,
        path: impl Into<PathBuf>,
        password: &str,
    ) -> Result<Self, KeystoreError> {
        let legacy_path = legacy_path.as_ref();
        let legacy = L::open(legacy_path, password)?;
        let keystore = Keystore::new(path, legacy.name().as_deref());

        let accounts = legacy.accounts();
        let count = accounts.len();
        {
            let session = keystore.unlock(password)?;
            for account in accounts {
                keystore.create_contract_account(account.contract, account.key.as_ref(), Some(&session))?;
            }
        }

        info!("Migrated {} accounts from {}", count, legacy_path.display());
        Ok(keystore)
    }
}
