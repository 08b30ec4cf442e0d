//! NEP-2 password-encrypted private keys.
//!
//! Layout of the 39-byte payload (base58check encoded):
//!
//! ```text
//! 0x01 0x42 0xE0 | address_hash (4) | AES-256-ECB(key XOR half1, half2) (32)
//! ```
//!
//! `address_hash` is the first 4 bytes of `SHA256(SHA256(address))` for the
//! key's standard signature address. It salts scrypt and doubles as the
//! checksum that detects a wrong password after decryption.
//!
//! Encryption is deterministic: the same key, password, and scrypt
//! parameters always produce the same string.

use crate::keys::{KeyError, KeyPair};
use crate::scrypt::{ScryptError, ScryptParameters};
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use nep6_types::base58;
use nep6_types::constants::PRIVATE_KEY_SIZE;
use nep6_types::script::double_sha256;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

/// Fixed prefix: two version bytes plus the flag byte.
pub const NEP2_PREFIX: [u8; 3] = [0x01, 0x42, 0xE0];

/// Address hash length.
pub const ADDRESS_HASH_SIZE: usize = 4;

/// Decoded payload size.
pub const NEP2_PAYLOAD_SIZE: usize = NEP2_PREFIX.len() + ADDRESS_HASH_SIZE + PRIVATE_KEY_SIZE;

const HASH_OFFSET: usize = NEP2_PREFIX.len();
const CIPHER_OFFSET: usize = HASH_OFFSET + ADDRESS_HASH_SIZE;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Nep2Error {
    #[error("malformed NEP-2 key: {0}")]
    Malformed(String),

    /// Recovered key does not match the embedded address hash. A wrong
    /// password and a tampered ciphertext look identical here.
    #[error("wrong password or corrupted key")]
    InvalidPassword,

    #[error("scrypt: {0}")]
    Scrypt(#[from] ScryptError),

    #[error("key: {0}")]
    Key(#[from] KeyError),
}

/// First four bytes of `SHA256(SHA256(address))`.
pub fn address_hash(address: &str) -> [u8; ADDRESS_HASH_SIZE] {
    let digest = double_sha256(address.as_bytes());
    let mut out = [0u8; ADDRESS_HASH_SIZE];
    out.copy_from_slice(&digest[..ADDRESS_HASH_SIZE]);
    out
}

/// A NEP-2 encoded private key. Carries no plaintext key material.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EncryptedKey(String);

impl EncryptedKey {
    /// Validate the structure of a NEP-2 string without a password.
    pub fn parse(encoded: &str) -> Result<Self, Nep2Error> {
        decode_payload(encoded)?;
        Ok(Self(encoded.to_string()))
    }

    /// Encrypt `key` under `password`.
    pub fn encrypt(
        key: &KeyPair,
        password: &str,
        scrypt: &ScryptParameters,
    ) -> Result<Self, Nep2Error> {
        let hash = address_hash(&key.address());
        let derived = derive(password, &hash, scrypt)?;

        let private = key.private_key();
        let mut block = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        for (i, byte) in block.iter_mut().enumerate() {
            *byte = private[i] ^ derived[i];
        }

        let cipher = Aes256::new(GenericArray::from_slice(&derived[PRIVATE_KEY_SIZE..]));
        for chunk in block.chunks_exact_mut(16) {
            cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
        }

        let mut payload = [0u8; NEP2_PAYLOAD_SIZE];
        payload[..HASH_OFFSET].copy_from_slice(&NEP2_PREFIX);
        payload[HASH_OFFSET..CIPHER_OFFSET].copy_from_slice(&hash);
        payload[CIPHER_OFFSET..].copy_from_slice(&block[..]);

        Ok(Self(base58::encode_check(&payload)))
    }

    /// Recover the private key.
    ///
    /// Structural problems fail with [`Nep2Error::Malformed`] before any
    /// scrypt work is done.
    pub fn decrypt(&self, password: &str, scrypt: &ScryptParameters) -> Result<KeyPair, Nep2Error> {
        let payload = decode_payload(&self.0)?;
        let mut hash = [0u8; ADDRESS_HASH_SIZE];
        hash.copy_from_slice(&payload[HASH_OFFSET..CIPHER_OFFSET]);

        let derived = derive(password, &hash, scrypt)?;

        let mut block = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        block.copy_from_slice(&payload[CIPHER_OFFSET..]);
        let cipher = Aes256::new(GenericArray::from_slice(&derived[PRIVATE_KEY_SIZE..]));
        for chunk in block.chunks_exact_mut(16) {
            cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
        }
        for (i, byte) in block.iter_mut().enumerate() {
            *byte ^= derived[i];
        }

        // An out-of-range scalar can only come from a wrong password.
        let key = KeyPair::from_private_key(&block[..]).map_err(|_| Nep2Error::InvalidPassword)?;
        if address_hash(&key.address()) != hash {
            return Err(Nep2Error::InvalidPassword);
        }
        Ok(key)
    }

    /// The address hash embedded in the payload.
    pub fn address_hash(&self) -> Result<[u8; ADDRESS_HASH_SIZE], Nep2Error> {
        let payload = decode_payload(&self.0)?;
        let mut hash = [0u8; ADDRESS_HASH_SIZE];
        hash.copy_from_slice(&payload[HASH_OFFSET..CIPHER_OFFSET]);
        Ok(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for EncryptedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptedKey({})", self.0)
    }
}

impl std::fmt::Display for EncryptedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EncryptedKey {
    type Error = Nep2Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        decode_payload(&value)?;
        Ok(Self(value))
    }
}

impl From<EncryptedKey> for String {
    fn from(key: EncryptedKey) -> Self {
        key.0
    }
}

fn decode_payload(encoded: &str) -> Result<[u8; NEP2_PAYLOAD_SIZE], Nep2Error> {
    let data = base58::decode_check(encoded).map_err(|e| Nep2Error::Malformed(e.to_string()))?;
    let payload: [u8; NEP2_PAYLOAD_SIZE] = data.as_slice().try_into().map_err(|_| {
        Nep2Error::Malformed(format!(
            "expected {} bytes, got {}",
            NEP2_PAYLOAD_SIZE,
            data.len()
        ))
    })?;
    if payload[..HASH_OFFSET] != NEP2_PREFIX {
        return Err(Nep2Error::Malformed("bad prefix".into()));
    }
    Ok(payload)
}

fn derive(
    password: &str,
    salt: &[u8; ADDRESS_HASH_SIZE],
    scrypt: &ScryptParameters,
) -> Result<Zeroizing<[u8; ScryptParameters::DERIVED_KEY_LEN]>, Nep2Error> {
    let mut derived = Zeroizing::new([0u8; ScryptParameters::DERIVED_KEY_LEN]);
    scrypt.derive(password.as_bytes(), salt, &mut derived[..])?;
    Ok(derived)
}
