//! The keystore container.
//!
//! Holds accounts keyed by script hash behind a single `RwLock`. Read paths
//! hand out cloned snapshots. Scrypt work (encrypting, decrypting, password
//! checks) always happens outside the lock; only the final insert or lookup
//! takes it.

use crate::account::{Account, Contract};
use crate::error::KeystoreError;
use crate::session::UnlockSession;
use log::{debug, warn};
use nep6_crypto::{EncryptedKey, KeyPair, Nep2Error, ScryptParameters};
use nep6_types::ScriptHash;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Format version written by this crate.
pub const KEYSTORE_VERSION: &str = "1.0";

/// An NEP-6 keystore.
///
/// The keystore never stores a password. Operations that need one take an
/// [`UnlockSession`] obtained from [`Keystore::unlock`].
#[derive(Debug)]
pub struct Keystore {
    pub(crate) path: Option<PathBuf>,
    pub(crate) name: Option<String>,
    pub(crate) version: String,
    pub(crate) scrypt: ScryptParameters,
    pub(crate) accounts: RwLock<BTreeMap<ScriptHash, Account>>,
    pub(crate) extra: Option<Value>,
}

impl Keystore {
    /// Fresh, empty keystore saving to `path`, with default scrypt parameters.
    pub fn new(path: impl Into<PathBuf>, name: Option<&str>) -> Self {
        Self::with_scrypt(path, name, ScryptParameters::DEFAULT)
    }

    /// Fresh keystore with explicit scrypt parameters.
    pub fn with_scrypt(path: impl Into<PathBuf>, name: Option<&str>, scrypt: ScryptParameters) -> Self {
        let mut keystore = Self::in_memory(name, scrypt);
        keystore.path = Some(path.into());
        keystore
    }

    /// Fresh keystore with no backing file. [`Keystore::save`] fails until
    /// a path is set.
    pub fn in_memory(name: Option<&str>, scrypt: ScryptParameters) -> Self {
        Self {
            path: None,
            name: name.map(str::to_string),
            version: KEYSTORE_VERSION.to_string(),
            scrypt,
            accounts: RwLock::new(BTreeMap::new()),
            extra: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn scrypt(&self) -> &ScryptParameters {
        &self.scrypt
    }

    pub fn extra(&self) -> Option<&Value> {
        self.extra.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    // ── Account creation ────────────────────────────────────────────────

    /// Create a standard signature account from raw private key bytes.
    pub fn create_account(
        &self,
        private_key: &[u8],
        session: Option<&UnlockSession<'_>>,
    ) -> Result<Account, KeystoreError> {
        let session = self.bound(session)?;
        let key = KeyPair::from_private_key(private_key)?;
        self.add_signature_account(key, session)
    }

    /// Create an account for an arbitrary contract.
    ///
    /// Without a key the account is watch-only and no session is needed.
    /// Parameters with empty names are renamed `parameter{i}`.
    pub fn create_contract_account(
        &self,
        contract: Contract,
        key: Option<&KeyPair>,
        session: Option<&UnlockSession<'_>>,
    ) -> Result<Account, KeystoreError> {
        let contract = contract.with_default_names();
        let Some(key) = key else {
            return Ok(self.install(Account::new(contract, None)));
        };
        let session = self.bound(session)?;
        let encrypted = EncryptedKey::encrypt(key, session.password(), &self.scrypt)?;
        let account = Account::new(contract, Some(encrypted.clone()));
        let installed = self.install(account);
        session.remember(installed.script_hash(), encrypted, key.clone());
        Ok(installed)
    }

    /// Track a bare script hash with no contract and no key.
    pub fn create_watch_only(&self, script_hash: ScriptHash) -> Account {
        self.install(Account::watch_only(script_hash))
    }

    // ── Imports ─────────────────────────────────────────────────────────

    pub fn import_private_key(
        &self,
        private_key: &[u8],
        session: Option<&UnlockSession<'_>>,
    ) -> Result<Account, KeystoreError> {
        self.create_account(private_key, session)
    }

    /// Import a WIF private key.
    pub fn import_wif(&self, wif: &str, session: Option<&UnlockSession<'_>>) -> Result<Account, KeystoreError> {
        let session = self.bound(session)?;
        let key = KeyPair::from_wif(wif)?;
        self.add_signature_account(key, session)
    }

    /// Import an EC P-256 private key from a PKCS#8 or SEC1 file, PEM or DER.
    pub fn import_certificate(
        &self,
        input: &[u8],
        session: Option<&UnlockSession<'_>>,
    ) -> Result<Account, KeystoreError> {
        let session = self.bound(session)?;
        let key = KeyPair::from_certificate(input)?;
        self.add_signature_account(key, session)
    }

    /// Import a NEP-2 key encrypted under `passphrase`.
    ///
    /// The stored key stays encrypted under `passphrase`, not under the
    /// keystore password. With default scrypt parameters the string is kept
    /// verbatim; otherwise it is re-encrypted with this keystore's
    /// parameters.
    pub fn import_nep2(&self, nep2: &str, passphrase: &str) -> Result<Account, KeystoreError> {
        let imported = EncryptedKey::parse(nep2)?;
        let key = imported.decrypt(passphrase, &ScryptParameters::DEFAULT)?;
        let encrypted = if self.scrypt.is_default() {
            imported
        } else {
            EncryptedKey::encrypt(&key, passphrase, &self.scrypt)?
        };
        let account = Account::new(Contract::signature(key.public_key()), Some(encrypted));
        Ok(self.install(account))
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn contains(&self, script_hash: &ScriptHash) -> bool {
        self.accounts.read().contains_key(script_hash)
    }

    pub fn get_account(&self, script_hash: &ScriptHash) -> Option<Account> {
        self.accounts.read().get(script_hash).cloned()
    }

    /// Snapshot of all accounts, ordered by script hash.
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.read().values().cloned().collect()
    }

    /// First account flagged `is_default`, if any.
    pub fn default_account(&self) -> Option<Account> {
        self.accounts.read().values().find(|a| a.is_default).cloned()
    }

    /// Remove an account. Returns `false` if it was not present.
    pub fn delete_account(&self, script_hash: &ScriptHash) -> bool {
        let removed = self.accounts.write().remove(script_hash).is_some();
        if removed {
            debug!("Deleted account {}", script_hash);
        }
        removed
    }

    /// Edit the metadata of a stored account in place.
    ///
    /// Returns the updated snapshot, or `None` if the account is absent.
    pub fn update_account<F>(&self, script_hash: &ScriptHash, f: F) -> Option<Account>
    where
        F: FnOnce(&mut Account),
    {
        let mut accounts = self.accounts.write();
        let account = accounts.get_mut(script_hash)?;
        f(account);
        Some(account.clone())
    }

    // ── Passwords ───────────────────────────────────────────────────────

    /// Check `password` against the first key-bearing account.
    ///
    /// A keystore with no key-bearing account accepts any password.
    pub fn verify_password(&self, password: &str) -> Result<bool, KeystoreError> {
        let first_keyed = {
            let accounts = self.accounts.read();
            accounts
                .values()
                .find_map(|a| a.key().map(|k| (a.script_hash(), k.clone())))
        };
        let Some((script_hash, encrypted)) = first_keyed else {
            return Ok(true);
        };
        match encrypted.decrypt(password, &self.scrypt) {
            Ok(_) => Ok(true),
            Err(Nep2Error::InvalidPassword) => Ok(false),
            Err(e) => {
                warn!("Account {} holds an unreadable key: {}", script_hash, e);
                Err(e.into())
            }
        }
    }

    /// Open an unlock session. The session is the only holder of the
    /// password and of decrypted keys; dropping it locks the keystore again.
    pub fn unlock(&self, password: &str) -> Result<UnlockSession<'_>, KeystoreError> {
        if !self.verify_password(password)? {
            return Err(KeystoreError::InvalidPassword);
        }
        Ok(UnlockSession::new(self, password))
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Reject missing sessions and sessions opened on another keystore.
    fn bound<'a, 'k>(
        &self,
        session: Option<&'a UnlockSession<'k>>,
    ) -> Result<&'a UnlockSession<'k>, KeystoreError> {
        match session {
            Some(s) if std::ptr::eq(s.keystore(), self) => Ok(s),
            _ => Err(KeystoreError::NotUnlocked),
        }
    }

    fn add_signature_account(&self, key: KeyPair, session: &UnlockSession<'_>) -> Result<Account, KeystoreError> {
        let encrypted = EncryptedKey::encrypt(&key, session.password(), &self.scrypt)?;
        let account = Account::new(Contract::signature(key.public_key()), Some(encrypted.clone()));
        let installed = self.install(account);
        session.remember(installed.script_hash(), encrypted, key);
        Ok(installed)
    }

    /// Reconcile against any stored entry and insert, under one write lock.
    pub(crate) fn install(&self, incoming: Account) -> Account {
        let script_hash = incoming.script_hash();
        let mut accounts = self.accounts.write();
        let merged = match accounts.get(&script_hash) {
            Some(existing) => {
                debug!("Reconciling account {} with stored entry", script_hash);
                incoming.reconcile(existing)
            }
            None => {
                debug!("Adding account {}", script_hash);
                incoming
            }
        };
        accounts.insert(script_hash, merged.clone());
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nep6_types::ContractParameterType;

    fn fast() -> ScryptParameters {
        ScryptParameters::new(16, 1, 1).unwrap()
    }

    fn keystore() -> Keystore {
        Keystore::in_memory(Some("test"), fast())
    }

    #[test]
    fn test_fresh_keystore() {
        let ks = Keystore::new("/tmp/none.json", Some("wallet"));
        assert_eq!(ks.name(), Some("wallet"));
        assert_eq!(ks.version(), "1.0");
        assert!(ks.scrypt().is_default());
        assert!(ks.extra().is_none());
        assert_eq!(ks.path(), Some(Path::new("/tmp/none.json")));
        assert!(ks.accounts().is_empty());
    }

    #[test]
    fn test_create_requires_session() {
        let ks = keystore();
        assert!(matches!(
            ks.create_account(&[0x11; 32], None),
            Err(KeystoreError::NotUnlocked)
        ));
        assert!(ks.accounts().is_empty());
    }

    #[test]
    fn test_foreign_session_rejected() {
        let ks = keystore();
        let other = keystore();
        let session = other.unlock("pw").unwrap();
        assert!(matches!(
            ks.create_account(&[0x11; 32], Some(&session)),
            Err(KeystoreError::NotUnlocked)
        ));
    }

    #[test]
    fn test_create_account() {
        let ks = keystore();
        let session = ks.unlock("pw").unwrap();
        let account = ks.create_account(&[0x11; 32], Some(&session)).unwrap();

        let key = KeyPair::from_private_key(&[0x11; 32]).unwrap();
        assert_eq!(account.script_hash(), key.script_hash());
        assert_eq!(account.address(), key.address());
        assert!(account.has_key());
        assert!(ks.contains(&key.script_hash()));
        assert_eq!(ks.get_account(&key.script_hash()), Some(account));
    }

    #[test]
    fn test_watch_only_contract_needs_no_session() {
        let ks = keystore();
        let contract = Contract::from_parameter_types(vec![0x51, 0xae], &[ContractParameterType::Signature]);
        let account = ks.create_contract_account(contract, None, None).unwrap();
        assert!(account.is_watch_only());

        let key = KeyPair::from_private_key(&[0x11; 32]).unwrap();
        let contract = Contract::signature(key.public_key());
        assert!(matches!(
            ks.create_contract_account(contract, Some(&key), None),
            Err(KeystoreError::NotUnlocked)
        ));
    }

    #[test]
    fn test_delete_account() {
        let ks = keystore();
        let hash = ScriptHash::new([5; 20]);
        ks.create_watch_only(hash);
        assert!(ks.delete_account(&hash));
        assert!(!ks.delete_account(&hash));
        assert!(ks.get_account(&hash).is_none());
    }

    #[test]
    fn test_update_and_default_account() {
        let ks = keystore();
        let hash = ScriptHash::new([5; 20]);
        ks.create_watch_only(hash);
        assert!(ks.default_account().is_none());

        let updated = ks
            .update_account(&hash, |a| {
                a.label = Some("main".into());
                a.is_default = true;
            })
            .unwrap();
        assert_eq!(updated.label.as_deref(), Some("main"));
        assert_eq!(ks.default_account().map(|a| a.script_hash()), Some(hash));
        assert!(ks.update_account(&ScriptHash::new([6; 20]), |_| {}).is_none());
    }

    #[test]
    fn test_verify_password() {
        let ks = keystore();
        // Nothing to check against yet.
        assert!(ks.verify_password("anything").unwrap());

        {
            let session = ks.unlock("pw").unwrap();
            ks.create_account(&[0x11; 32], Some(&session)).unwrap();
        }
        assert!(ks.verify_password("pw").unwrap());
        assert!(!ks.verify_password("nope").unwrap());
        assert!(matches!(ks.unlock("nope"), Err(KeystoreError::InvalidPassword)));
    }

    #[test]
    fn test_import_nep2_keeps_passphrase() {
        let ks = keystore();
        let key = KeyPair::from_private_key(&[0x44; 32]).unwrap();
        let nep2 = EncryptedKey::encrypt(&key, "import-pw", &ScryptParameters::DEFAULT).unwrap();

        let account = ks.import_nep2(nep2.as_str(), "import-pw").unwrap();
        assert_eq!(account.script_hash(), key.script_hash());
        // Non-default parameters: re-encrypted, still under the passphrase.
        let stored = account.key().unwrap();
        assert_ne!(stored, &nep2);
        assert_eq!(stored.decrypt("import-pw", &fast()).unwrap(), key);

        assert!(matches!(
            ks.import_nep2(nep2.as_str(), "wrong"),
            Err(KeystoreError::InvalidPassword)
        ));
        assert!(matches!(
            ks.import_nep2("garbage", "import-pw"),
            Err(KeystoreError::CorruptedKeystore(_))
        ));
    }

    #[test]
    fn test_import_wif_and_private_key() {
        let ks = keystore();
        let session = ks.unlock("pw").unwrap();
        let key = KeyPair::from_private_key(&[0x55; 32]).unwrap();

        let a = ks.import_wif(&key.export_wif(), Some(&session)).unwrap();
        assert_eq!(a.script_hash(), key.script_hash());
        assert!(matches!(
            ks.import_wif("bad", Some(&session)),
            Err(KeystoreError::Key(_))
        ));

        let b = ks.import_private_key(&[0x55; 32], Some(&session)).unwrap();
        assert_eq!(b.script_hash(), a.script_hash());
        assert_eq!(ks.accounts().len(), 1);
    }
}
