//! Unlock sessions.
//!
//! A session owns the keystore password and every key pair decrypted while
//! it is alive. Both are wiped when the session drops.

use crate::error::KeystoreError;
use crate::keystore::Keystore;
use log::debug;
use nep6_crypto::{EncryptedKey, KeyPair};
use nep6_types::ScriptHash;
use parking_lot::Mutex;
use std::collections::HashMap;
use zeroize::Zeroizing;

struct CachedKey {
    encrypted: EncryptedKey,
    key: KeyPair,
}

/// Scoped proof that the keystore password is known.
///
/// Created by [`Keystore::unlock`]. Borrowing the keystore keeps a session
/// from outliving it.
pub struct UnlockSession<'k> {
    keystore: &'k Keystore,
    password: Zeroizing<String>,
    cache: Mutex<HashMap<ScriptHash, CachedKey>>,
}

impl<'k> UnlockSession<'k> {
    pub(crate) fn new(keystore: &'k Keystore, password: &str) -> Self {
        debug!("Keystore unlocked");
        Self {
            keystore,
            password: Zeroizing::new(password.to_string()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn keystore(&self) -> &'k Keystore {
        self.keystore
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    pub(crate) fn remember(&self, script_hash: ScriptHash, encrypted: EncryptedKey, key: KeyPair) {
        self.prune();
        self.cache.lock().insert(script_hash, CachedKey { encrypted, key });
    }

    /// Drop cached keys whose account is gone or whose stored ciphertext has
    /// changed since decryption.
    fn prune(&self) {
        let accounts = self.keystore.accounts.read();
        self.cache
            .lock()
            .retain(|hash, cached| accounts.get(hash).and_then(|a| a.key()) == Some(&cached.encrypted));
    }

    /// Decrypted key pair for an account.
    ///
    /// Returns `Ok(None)` for watch-only accounts and
    /// [`KeystoreError::AccountNotFound`] for unknown script hashes. Keys are
    /// decrypted on first use and cached until the session drops. A cached
    /// key whose stored ciphertext has since changed is decrypted again.
    pub fn get_key(&self, script_hash: &ScriptHash) -> Result<Option<KeyPair>, KeystoreError> {
        let Some(account) = self.keystore.get_account(script_hash) else {
            self.cache.lock().remove(script_hash);
            return Err(KeystoreError::AccountNotFound(*script_hash));
        };
        let Some(encrypted) = account.key() else {
            self.cache.lock().remove(script_hash);
            return Ok(None);
        };

        if let Some(cached) = self.cache.lock().get(script_hash) {
            if &cached.encrypted == encrypted {
                return Ok(Some(cached.key.clone()));
            }
        }

        let key = self.decrypt_key(encrypted)?;
        self.remember(*script_hash, encrypted.clone(), key.clone());
        Ok(Some(key))
    }

    /// Decrypt a NEP-2 key with the session password and the keystore's
    /// scrypt parameters.
    pub fn decrypt_key(&self, encrypted: &EncryptedKey) -> Result<KeyPair, KeystoreError> {
        Ok(encrypted.decrypt(&self.password, self.keystore.scrypt())?)
    }

    /// Check a password without scrypt when every key-bearing account is
    /// already decrypted in this session.
    ///
    /// A keystore with no key-bearing account accepts any password.
    pub fn verify_password(&self, password: &str) -> Result<bool, KeystoreError> {
        self.prune();
        let accounts = self.keystore.accounts();
        if accounts.iter().all(|a| a.is_watch_only()) {
            return Ok(true);
        }
        let covered = {
            let cache = self.cache.lock();
            accounts
                .iter()
                .filter(|a| a.has_key())
                .all(|a| cache.contains_key(&a.script_hash()))
        };
        if covered {
            return Ok(password == self.password.as_str());
        }
        self.keystore.verify_password(password)
    }

    /// Delete an account and wipe its decrypted key from this session.
    ///
    /// Other live sessions drop their copy on their next access.
    pub fn delete_account(&self, script_hash: &ScriptHash) -> bool {
        self.cache.lock().remove(script_hash);
        self.keystore.delete_account(script_hash)
    }

    /// Number of decrypted keys currently held.
    pub fn cached_keys(&self) -> usize {
        self.prune();
        self.cache.lock().len()
    }
}

impl Drop for UnlockSession<'_> {
    fn drop(&mut self) {
        let cache = self.cache.get_mut();
        let count = cache.len();
        // KeyPair secrets zeroize themselves on drop.
        cache.clear();
        debug!("Keystore locked, dropped {} decrypted keys", count);
    }
}

impl std::fmt::Debug for UnlockSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockSession")
            .field("keystore", &self.keystore.name())
            .field("cached_keys", &self.cache.lock().len())
            .finish_non_exhaustive()
    }
}
