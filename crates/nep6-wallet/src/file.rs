//! NEP-6 JSON persistence.
//!
//! ```json
//! {
//!   "name": "wallet", "version": "1.0",
//!   "scrypt": {"n": 16384, "r": 8, "p": 8},
//!   "accounts": [{
//!     "address": "A...", "label": null, "isDefault": false, "lock": false,
//!     "key": "6P...",
//!     "contract": {"script": "21..ac", "parameters": [{"name": "signature", "type": "Signature"}], "deployed": false},
//!     "extra": null
//!   }],
//!   "extra": null
//! }
//! ```
//!
//! Loading never needs a password.

use crate::account::{Account, Contract, ContractParameter};
use crate::error::KeystoreError;
use crate::keystore::Keystore;
use log::info;
use nep6_crypto::{EncryptedKey, ScryptParameters};
use nep6_types::{from_address, ContractParameterType};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Only major version 1 is understood.
const SUPPORTED_MAJOR: u32 = 1;

#[derive(Serialize, Deserialize)]
struct KeystoreJson {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    scrypt: Option<ScryptParameters>,
    #[serde(default)]
    accounts: Option<Vec<AccountJson>>,
    #[serde(default)]
    extra: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct AccountJson {
    address: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(rename = "isDefault", default)]
    is_default: bool,
    #[serde(default)]
    lock: bool,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    contract: Option<ContractJson>,
    #[serde(default)]
    extra: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct ContractJson {
    script: String,
    parameters: Vec<ParameterJson>,
    deployed: bool,
}

#[derive(Serialize, Deserialize)]
struct ParameterJson {
    name: String,
    #[serde(rename = "type")]
    parameter_type: ContractParameterType,
}

impl From<&Account> for AccountJson {
    fn from(account: &Account) -> Self {
        Self {
            address: account.address(),
            label: account.label.clone(),
            is_default: account.is_default,
            lock: account.lock,
            key: account.key().map(|k| k.as_str().to_string()),
            contract: account.contract().map(|c| ContractJson {
                script: hex::encode(c.script()),
                parameters: c
                    .parameters()
                    .iter()
                    .map(|p| ParameterJson {
                        name: p.name.clone(),
                        parameter_type: p.parameter_type,
                    })
                    .collect(),
                deployed: c.deployed(),
            }),
            extra: account.extra.clone(),
        }
    }
}

impl TryFrom<AccountJson> for Account {
    type Error = KeystoreError;

    fn try_from(json: AccountJson) -> Result<Self, Self::Error> {
        let script_hash = from_address(&json.address)?;

        let contract = match json.contract {
            Some(c) => {
                let script = hex::decode(&c.script).map_err(|e| {
                    KeystoreError::CorruptedKeystore(format!("contract script for {}: {}", json.address, e))
                })?;
                let parameters = c
                    .parameters
                    .into_iter()
                    .map(|p| ContractParameter::new(p.name, p.parameter_type))
                    .collect();
                let contract = Contract::new(script, parameters, c.deployed);
                if contract.script_hash() != script_hash {
                    return Err(KeystoreError::CorruptedKeystore(format!(
                        "contract script does not hash to {}",
                        json.address
                    )));
                }
                Some(contract)
            }
            None => None,
        };

        let key = json.key.as_deref().map(EncryptedKey::parse).transpose()?;

        let mut account = Account::from_parts(script_hash, contract, key);
        account.label = json.label;
        account.is_default = json.is_default;
        account.lock = json.lock;
        account.extra = json.extra;
        Ok(account)
    }
}

fn check_version(version: &str) -> Result<(), KeystoreError> {
    let major = version.split('.').next().and_then(|m| m.trim().parse::<u32>().ok());
    match major {
        Some(SUPPORTED_MAJOR) => Ok(()),
        _ => Err(KeystoreError::UnsupportedFormatVersion(version.to_string())),
    }
}

impl Keystore {
    fn to_document(&self) -> KeystoreJson {
        let accounts = self.accounts.read().values().map(AccountJson::from).collect();
        KeystoreJson {
            name: self.name.clone(),
            version: Some(self.version.clone()),
            scrypt: Some(self.scrypt),
            accounts: Some(accounts),
            extra: self.extra.clone(),
        }
    }

    /// Serialize to the NEP-6 document.
    pub fn to_json(&self) -> Result<Value, KeystoreError> {
        Ok(serde_json::to_value(self.to_document())?)
    }

    /// Write the keystore to its path, atomically via `<path>.tmp`.
    pub fn save(&self) -> Result<(), KeystoreError> {
        let path = self.path.as_deref().ok_or(KeystoreError::NoPath)?;
        let document = self.to_document();
        let count = document.accounts.as_ref().map_or(0, Vec::len);
        let text = serde_json::to_string_pretty(&document)?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, path)?;

        info!("Saved keystore with {} accounts to {}", count, path.display());
        Ok(())
    }

    /// Parse an in-memory NEP-6 document. The result has no path.
    pub fn from_json(value: Value) -> Result<Self, KeystoreError> {
        let document: KeystoreJson = serde_json::from_value(value)
            .map_err(|e| KeystoreError::CorruptedKeystore(e.to_string()))?;

        let version = document
            .version
            .ok_or_else(|| KeystoreError::CorruptedKeystore("missing version".into()))?;
        check_version(&version)?;
        let scrypt = document
            .scrypt
            .ok_or_else(|| KeystoreError::CorruptedKeystore("missing scrypt parameters".into()))?;
        let entries = document
            .accounts
            .ok_or_else(|| KeystoreError::CorruptedKeystore("missing accounts".into()))?;

        let mut accounts = BTreeMap::new();
        for entry in entries {
            let account = Account::try_from(entry)?;
            let script_hash = account.script_hash();
            if accounts.insert(script_hash, account).is_some() {
                return Err(KeystoreError::CorruptedKeystore(format!(
                    "duplicate account {}",
                    script_hash
                )));
            }
        }

        Ok(Self {
            path: None,
            name: document.name,
            version,
            scrypt,
            accounts: RwLock::new(accounts),
            extra: document.extra,
        })
    }

    /// Load a keystore file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KeystoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| KeystoreError::CorruptedKeystore(e.to_string()))?;
        let mut keystore = Self::from_json(value)?;
        keystore.path = Some(path.to_path_buf());
        info!(
            "Loaded keystore with {} accounts from {}",
            keystore.accounts.read().len(),
            path.display()
        );
        Ok(keystore)
    }

    /// Load `path` if it exists, otherwise start a fresh keystore there.
    pub fn open(path: impl AsRef<Path>, name: Option<&str>) -> Result<Self, KeystoreError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new(path, name))
        }
    }
}
