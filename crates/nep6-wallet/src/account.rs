//! Accounts and their verification contracts.
//!
//! An account is keyed by the script hash of its contract. It may carry a
//! NEP-2 encrypted key; accounts without one are watch-only. Decrypted key
//! pairs never live here, see [`crate::session::UnlockSession`].

use nep6_crypto::EncryptedKey;
use nep6_types::script::is_signature_contract;
use nep6_types::{to_address, ContractParameterType, ScriptHash};
use serde_json::Value;

/// Shape of a contract script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    /// `PUSHBYTES33 <pubkey> CHECKSIG`.
    Standard,
    /// Anything else, multi-sig included.
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractParameter {
    pub name: String,
    pub parameter_type: ContractParameterType,
}

impl ContractParameter {
    pub fn new(name: impl Into<String>, parameter_type: ContractParameterType) -> Self {
        Self {
            name: name.into(),
            parameter_type,
        }
    }
}

/// A verification contract: script bytes plus its ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    script: Vec<u8>,
    parameters: Vec<ContractParameter>,
    deployed: bool,
}

impl Contract {
    pub fn new(script: Vec<u8>, parameters: Vec<ContractParameter>, deployed: bool) -> Self {
        Self {
            script,
            parameters,
            deployed,
        }
    }

    /// Contract with unnamed parameters. Names default to `parameter0..N`.
    pub fn from_parameter_types(script: Vec<u8>, types: &[ContractParameterType]) -> Self {
        let parameters = types
            .iter()
            .enumerate()
            .map(|(i, ty)| ContractParameter::new(format!("parameter{}", i), *ty))
            .collect();
        Self::new(script, parameters, false)
    }

    /// Standard single-signature contract for a compressed public key.
    pub fn signature(public_key: &[u8; 33]) -> Self {
        Self::new(
            nep6_types::script::signature_redeem_script(public_key),
            vec![ContractParameter::new("signature", ContractParameterType::Signature)],
            false,
        )
    }

    pub fn kind(&self) -> ContractKind {
        if is_signature_contract(&self.script) {
            ContractKind::Standard
        } else {
            ContractKind::Custom
        }
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }

    pub fn script_hash(&self) -> ScriptHash {
        ScriptHash::from_script(&self.script)
    }

    pub fn parameters(&self) -> &[ContractParameter] {
        &self.parameters
    }

    pub fn parameter_types(&self) -> Vec<ContractParameterType> {
        self.parameters.iter().map(|p| p.parameter_type).collect()
    }

    pub fn deployed(&self) -> bool {
        self.deployed
    }

    /// Fill empty parameter names with `parameter{i}`.
    pub(crate) fn with_default_names(mut self) -> Self {
        for (i, param) in self.parameters.iter_mut().enumerate() {
            if param.name.is_empty() {
                param.name = format!("parameter{}", i);
            }
        }
        self
    }

    /// Incoming script and parameter types, existing names and `deployed`.
    ///
    /// Names are taken index-wise from `existing`; parameters beyond the
    /// existing list keep their incoming names.
    fn reconcile(self, existing: &Contract) -> Contract {
        let parameters = self
            .parameters
            .into_iter()
            .enumerate()
            .map(|(i, param)| match existing.parameters.get(i) {
                Some(old) => ContractParameter::new(old.name.clone(), param.parameter_type),
                None => param,
            })
            .collect();
        Contract {
            script: self.script,
            parameters,
            deployed: existing.deployed,
        }
    }
}

/// A keystore entry.
///
/// `label`, `is_default`, `lock` and `extra` are free metadata. The script
/// hash, contract and key are fixed at construction so the hash always
/// matches the contract script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    script_hash: ScriptHash,
    contract: Option<Contract>,
    key: Option<EncryptedKey>,
    pub label: Option<String>,
    pub is_default: bool,
    /// User freeze flag. Unrelated to encryption.
    pub lock: bool,
    pub extra: Option<Value>,
}

impl Account {
    /// Account for `contract`, keyed by the contract's script hash.
    pub fn new(contract: Contract, key: Option<EncryptedKey>) -> Self {
        Self {
            script_hash: contract.script_hash(),
            contract: Some(contract),
            key,
            label: None,
            is_default: false,
            lock: false,
            extra: None,
        }
    }

    /// Bare script hash with no contract and no key.
    pub fn watch_only(script_hash: ScriptHash) -> Self {
        Self {
            script_hash,
            contract: None,
            key: None,
            label: None,
            is_default: false,
            lock: false,
            extra: None,
        }
    }

    pub fn script_hash(&self) -> ScriptHash {
        self.script_hash
    }

    pub fn address(&self) -> String {
        to_address(&self.script_hash)
    }

    pub fn contract(&self) -> Option<&Contract> {
        self.contract.as_ref()
    }

    pub fn key(&self) -> Option<&EncryptedKey> {
        self.key.as_ref()
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    pub fn is_watch_only(&self) -> bool {
        self.key.is_none()
    }

    /// Merge an incoming account with the entry already stored under the
    /// same script hash.
    ///
    /// Metadata (`label`, `is_default`, `lock`, `extra`) comes from
    /// `existing`. The incoming contract wins, except that parameter names
    /// and `deployed` are kept from the existing contract. A missing
    /// incoming contract keeps the existing one. An incoming key replaces the
    /// stored key; a watch-only incoming account keeps the stored key.
    pub fn reconcile(self, existing: &Account) -> Account {
        let contract = match (self.contract, &existing.contract) {
            (None, old) => old.clone(),
            (Some(new), Some(old)) => Some(new.reconcile(old)),
            (Some(new), None) => Some(new),
        };
        Account {
            script_hash: self.script_hash,
            contract,
            key: self.key.or_else(|| existing.key.clone()),
            label: existing.label.clone(),
            is_default: existing.is_default,
            lock: existing.lock,
            extra: existing.extra.clone(),
        }
    }

    pub(crate) fn from_parts(
        script_hash: ScriptHash,
        contract: Option<Contract>,
        key: Option<EncryptedKey>,
    ) -> Self {
        Self {
            script_hash,
            contract,
            key,
            label: None,
            is_default: false,
            lock: false,
            extra: None,
        }
    }
}
