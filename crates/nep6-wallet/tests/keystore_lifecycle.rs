//! Keystore lifecycle: create, unlock, lock, re-import.
//!
//! Run with: cargo test -p nep6-wallet --test keystore_lifecycle

use nep6_wallet::{
    Contract, ContractKind, ContractParameterType, EncryptedKey, KeyPair, Keystore, KeystoreError,
    ScriptHash, ScryptParameters,
};

const TEST_KEY: &str = "cbf4b9f70470856bb4f40f80b87edb90865997ffee6df315ab166d713af433a5";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fast() -> ScryptParameters {
    ScryptParameters::new(16, 1, 1).unwrap()
}

fn test_key() -> Vec<u8> {
    hex::decode(TEST_KEY).unwrap()
}

// =============================================================================
// Default scrypt parameters end to end
// =============================================================================

#[test]
fn test_default_params_scenario() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.json");

    let ks = Keystore::new(&path, Some("default"));
    let account = {
        let session = ks.unlock("pw1").unwrap();
        ks.create_account(&test_key(), Some(&session)).unwrap()
    };

    let expected = KeyPair::from_private_key(&test_key()).unwrap().script_hash();
    assert_eq!(account.script_hash(), expected);
    assert_eq!(account.address(), "AStZHy8E6StCqYQbzMqi4poH7YNGHQKxvt");

    assert!(ks.unlock("pw1").is_ok());
    assert!(matches!(ks.unlock("wrong"), Err(KeystoreError::InvalidPassword)));

    ks.save().unwrap();
    let loaded = Keystore::load(&path).unwrap();
    let reloaded = loaded.get_account(&expected).unwrap();
    assert_eq!(
        reloaded.key().unwrap().as_str(),
        account.key().unwrap().as_str()
    );

    let session = loaded.unlock("pw1").unwrap();
    let key = session.get_key(&expected).unwrap().unwrap();
    assert_eq!(key.private_key().as_slice(), test_key().as_slice());
}

// =============================================================================
// Locking
// =============================================================================

#[test]
fn test_locked_after_session_drop() {
    init_logger();
    let ks = Keystore::in_memory(None, fast());
    {
        let session = ks.unlock("pw").unwrap();
        ks.create_account(&[0x11; 32], Some(&session)).unwrap();
    }

    assert!(matches!(
        ks.create_account(&[0x22; 32], None),
        Err(KeystoreError::NotUnlocked)
    ));
    let key = KeyPair::from_private_key(&[0x33; 32]).unwrap();
    assert!(matches!(
        ks.import_wif(&key.export_wif(), None),
        Err(KeystoreError::NotUnlocked)
    ));
    assert_eq!(ks.accounts().len(), 1);
}

#[test]
fn test_session_drops_on_error_path() {
    init_logger();
    let ks = Keystore::in_memory(None, fast());

    let attempt = |ks: &Keystore| -> Result<(), KeystoreError> {
        let session = ks.unlock("pw")?;
        ks.create_account(&[0x11; 32], Some(&session))?;
        ks.import_wif("definitely not wif", Some(&session))?;
        Ok(())
    };
    assert!(matches!(attempt(&ks), Err(KeystoreError::Key(_))));

    // The account created before the failure stays; the session is gone.
    assert_eq!(ks.accounts().len(), 1);
    assert!(matches!(
        ks.create_account(&[0x22; 32], None),
        Err(KeystoreError::NotUnlocked)
    ));
}

#[test]
fn test_watch_only_keystore_accepts_any_password() {
    init_logger();
    let ks = Keystore::in_memory(None, fast());
    assert!(ks.verify_password("x").unwrap());

    ks.create_watch_only(ScriptHash::new([1; 20]));
    let contract = Contract::from_parameter_types(vec![0x51, 0xae], &[ContractParameterType::Signature]);
    ks.create_contract_account(contract, None, None).unwrap();

    assert!(ks.verify_password("x").unwrap());
    assert!(ks.verify_password("y").unwrap());
    assert!(ks.unlock("anything").is_ok());
}

// =============================================================================
// Re-import and reconciliation through the keystore
// =============================================================================

#[test]
fn test_reimport_preserves_metadata_and_refreshes_key() {
    init_logger();
    let ks = Keystore::in_memory(None, fast());
    let key = KeyPair::from_private_key(&[0x11; 32]).unwrap();
    let hash = key.script_hash();

    // Start as watch-only and give it metadata.
    ks.create_watch_only(hash);
    ks.update_account(&hash, |a| {
        a.label = Some("cold".into());
        a.lock = true;
        a.extra = Some(serde_json::json!({"tag": 7}));
    })
    .unwrap();

    let session = ks.unlock("pw").unwrap();
    let account = ks.import_wif(&key.export_wif(), Some(&session)).unwrap();

    assert_eq!(account.label.as_deref(), Some("cold"));
    assert!(account.lock);
    assert_eq!(account.extra, Some(serde_json::json!({"tag": 7})));
    assert!(account.has_key());
    assert_eq!(account.contract().unwrap().kind(), ContractKind::Standard);
    assert_eq!(ks.accounts().len(), 1);

    // Watch-only re-creation keeps the key.
    let contract = Contract::signature(key.public_key());
    let again = ks.create_contract_account(contract, None, None).unwrap();
    assert_eq!(again.key(), account.key());
}

#[test]
fn test_multisig_contract_with_key() {
    init_logger();
    let ks = Keystore::in_memory(None, fast());
    let key = KeyPair::from_private_key(&[0x11; 32]).unwrap();

    let mut script = vec![0x51, 0x21];
    script.extend_from_slice(key.public_key());
    script.extend_from_slice(&[0x51, 0xae]);
    let contract = Contract::from_parameter_types(script, &[ContractParameterType::Signature]);

    let session = ks.unlock("pw").unwrap();
    let account = ks
        .create_contract_account(contract.clone(), Some(&key), Some(&session))
        .unwrap();
    assert_eq!(account.script_hash(), contract.script_hash());
    assert_ne!(account.script_hash(), key.script_hash());
    assert_eq!(account.contract().unwrap().kind(), ContractKind::Custom);

    let recovered = session.get_key(&account.script_hash()).unwrap().unwrap();
    assert_eq!(recovered, key);
}

#[test]
fn test_import_nep2_default_params_verbatim() {
    init_logger();
    let ks = Keystore::in_memory(None, ScryptParameters::DEFAULT);
    let nep2 = "6PYVPVe1fQznphjbUxXP9KZJqPMVnVwCx5s5pr5axRJ8uHkMtZg97eT5kL";

    let account = ks.import_nep2(nep2, "TestingOneTwoThree").unwrap();
    assert_eq!(account.key().map(EncryptedKey::as_str), Some(nep2));
    assert_eq!(account.address(), "AStZHy8E6StCqYQbzMqi4poH7YNGHQKxvt");
}

#[test]
fn test_import_certificate() {
    use p256::pkcs8::{EncodePrivateKey, LineEnding};

    init_logger();
    let secret = p256::SecretKey::from_slice(&test_key()).unwrap();
    let pem = secret.to_pkcs8_pem(LineEnding::LF).unwrap();

    let ks = Keystore::in_memory(None, fast());
    let session = ks.unlock("pw").unwrap();
    let account = ks.import_certificate(pem.as_bytes(), Some(&session)).unwrap();
    assert_eq!(account.address(), "AStZHy8E6StCqYQbzMqi4poH7YNGHQKxvt");

    let key = session.get_key(&account.script_hash()).unwrap().unwrap();
    assert_eq!(key.private_key().as_slice(), test_key().as_slice());

    assert!(matches!(
        ks.import_certificate(b"not a certificate", Some(&session)),
        Err(KeystoreError::Key(_))
    ));
}
