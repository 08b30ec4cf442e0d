//! secp256r1 key pairs, WIF, and private-key import.
//!
//! Key derivation and signing are treated as opaque primitives provided by
//! the `p256` crate. This module only adapts them to NEO encodings:
//! compressed public keys, signature redeem scripts, and WIF.

use nep6_types::base58;
use nep6_types::constants::{COMPRESSED_PUBKEY_SIZE, PRIVATE_KEY_SIZE};
use nep6_types::script::{signature_redeem_script, ScriptHash};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::DecodePrivateKey;
use p256::SecretKey;
use thiserror::Error;
use zeroize::Zeroizing;

/// WIF payload: 0x80 || key || 0x01.
const WIF_PREFIX: u8 = 0x80;
const WIF_SUFFIX: u8 = 0x01;
const WIF_PAYLOAD_SIZE: usize = 1 + PRIVATE_KEY_SIZE + 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid private key length: expected 32, got {0}")]
    InvalidLength(usize),

    #[error("private key is not a valid secp256r1 scalar")]
    InvalidScalar,

    #[error("invalid WIF: {0}")]
    InvalidWif(String),

    #[error("invalid certificate key: {0}")]
    InvalidCertificate(String),
}

/// A secp256r1 private key with its compressed public key.
///
/// The secret scalar is zeroized when the pair is dropped.
#[derive(Clone)]
pub struct KeyPair {
    secret: SecretKey,
    public: [u8; COMPRESSED_PUBKEY_SIZE],
}

impl KeyPair {
    /// Build a key pair from 32 raw private key bytes.
    pub fn from_private_key(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        let secret = SecretKey::from_slice(bytes).map_err(|_| KeyError::InvalidScalar)?;
        Ok(Self::from_secret(secret))
    }

    /// Generate a fresh random key pair.
    pub fn generate() -> Self {
        Self::from_secret(SecretKey::random(&mut rand::rngs::OsRng))
    }

    fn from_secret(secret: SecretKey) -> Self {
        let point = secret.public_key().to_encoded_point(true);
        let mut public = [0u8; COMPRESSED_PUBKEY_SIZE];
        public.copy_from_slice(point.as_bytes());
        Self { secret, public }
    }

    /// Decode a WIF string (`0x80 || key || 0x01`, base58check).
    pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
        let data = Zeroizing::new(
            base58::decode_check(wif).map_err(|e| KeyError::InvalidWif(e.to_string()))?,
        );
        if data.len() != WIF_PAYLOAD_SIZE {
            return Err(KeyError::InvalidWif(format!(
                "expected {} bytes, got {}",
                WIF_PAYLOAD_SIZE,
                data.len()
            )));
        }
        if data[0] != WIF_PREFIX || data[WIF_PAYLOAD_SIZE - 1] != WIF_SUFFIX {
            return Err(KeyError::InvalidWif("bad prefix or suffix byte".into()));
        }
        Self::from_private_key(&data[1..1 + PRIVATE_KEY_SIZE])
    }

    /// Import an EC P-256 private key from a certificate key file.
    ///
    /// Accepts PKCS#8 or SEC1, PEM or DER.
    pub fn from_certificate(input: &[u8]) -> Result<Self, KeyError> {
        let secret = match std::str::from_utf8(input) {
            Ok(text) if text.trim_start().starts_with("-----BEGIN") => {
                let text = text.trim();
                SecretKey::from_pkcs8_pem(text)
                    .or_else(|_| SecretKey::from_sec1_pem(text))
                    .map_err(|e| KeyError::InvalidCertificate(e.to_string()))?
            }
            _ => SecretKey::from_pkcs8_der(input)
                .or_else(|_| SecretKey::from_sec1_der(input))
                .map_err(|e| KeyError::InvalidCertificate(e.to_string()))?,
        };
        Ok(Self::from_secret(secret))
    }

    /// Raw private key bytes. Zeroized when the returned value drops.
    pub fn private_key(&self) -> Zeroizing<[u8; PRIVATE_KEY_SIZE]> {
        let mut out = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        out.copy_from_slice(&self.secret.to_bytes());
        out
    }

    /// Compressed SEC1 public key.
    pub fn public_key(&self) -> &[u8; COMPRESSED_PUBKEY_SIZE] {
        &self.public
    }

    /// Standard single-signature verification script for this key.
    pub fn verification_script(&self) -> Vec<u8> {
        signature_redeem_script(&self.public)
    }

    /// Script hash of [`Self::verification_script`].
    pub fn script_hash(&self) -> ScriptHash {
        ScriptHash::from_script(&self.verification_script())
    }

    /// Address of the standard signature contract.
    pub fn address(&self) -> String {
        nep6_types::to_address(&self.script_hash())
    }

    /// Export as WIF.
    pub fn export_wif(&self) -> Zeroizing<String> {
        let mut data = Zeroizing::new([0u8; WIF_PAYLOAD_SIZE]);
        data[0] = WIF_PREFIX;
        data[1..1 + PRIVATE_KEY_SIZE].copy_from_slice(&*self.private_key());
        data[WIF_PAYLOAD_SIZE - 1] = WIF_SUFFIX;
        Zeroizing::new(base58::encode_check(&data[..]))
    }

    /// ECDSA-SHA256 signature over `data`, as 64 bytes `r || s`.
    pub fn sign(&self, data: &[u8]) -> [u8; 64] {
        let signing_key = SigningKey::from(&self.secret);
        let signature: Signature = signing_key.sign(data);
        let mut out = [0u8; 64];
        out.copy_from_slice(&signature.to_bytes());
        out
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public
    }
}

impl Eq for KeyPair {}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &hex::encode(self.public))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Verify an ECDSA-SHA256 signature against a SEC1-encoded public key.
pub fn verify_signature(public_key: &[u8], data: &[u8], signature: &[u8]) -> bool {
    let Ok(key) = VerifyingKey::from_sec1_bytes(public_key) else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(signature) else {
        return false;
    };
    key.verify(data, &sig).is_ok()
}
