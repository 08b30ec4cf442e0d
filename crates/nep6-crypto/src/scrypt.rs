//! Scrypt cost parameters and key derivation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScryptError {
    #[error("n must be a power of two greater than 1, got {0}")]
    InvalidN(u32),

    #[error("r must be positive")]
    InvalidR,

    #[error("p must be positive with r * p below 2^30")]
    InvalidP,

    #[error("scrypt cost too high: n={n}, r={r} exceeds the 1 GiB limit")]
    CostTooHigh { n: u32, r: u32 },

    #[error("parameters rejected by scrypt: {0}")]
    Rejected(String),
}

/// Upper bound on the scrypt working set (`128 * n * r` bytes).
pub const MAX_MEMORY: u64 = 1 << 30;

/// Immutable scrypt cost triple.
///
/// Serialized as `{"n": .., "r": .., "p": ..}`. Deserialization validates the
/// values, so a keystore can never carry parameters scrypt would refuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawScryptParameters")]
pub struct ScryptParameters {
    n: u32,
    r: u32,
    p: u32,
}

#[derive(Deserialize)]
struct RawScryptParameters {
    n: u32,
    r: u32,
    p: u32,
}

impl TryFrom<RawScryptParameters> for ScryptParameters {
    type Error = ScryptError;

    fn try_from(raw: RawScryptParameters) -> Result<Self, Self::Error> {
        Self::new(raw.n, raw.r, raw.p)
    }
}

impl Default for ScryptParameters {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ScryptParameters {
    /// The historical NEP-2 standard: N=16384, r=8, p=8.
    pub const DEFAULT: Self = Self { n: 16384, r: 8, p: 8 };

    /// Output length used by NEP-2 (two 32-byte halves).
    pub const DERIVED_KEY_LEN: usize = 64;

    pub fn new(n: u32, r: u32, p: u32) -> Result<Self, ScryptError> {
        if n < 2 || !n.is_power_of_two() {
            return Err(ScryptError::InvalidN(n));
        }
        if r == 0 {
            return Err(ScryptError::InvalidR);
        }
        if p == 0 {
            return Err(ScryptError::InvalidP);
        }
        if 128 * u64::from(n) * u64::from(r) > MAX_MEMORY {
            return Err(ScryptError::CostTooHigh { n, r });
        }
        if u64::from(r) * u64::from(p) >= 1 << 30 {
            return Err(ScryptError::InvalidP);
        }
        Ok(Self { n, r, p })
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p(&self) -> u32 {
        self.p
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    /// Derive `out.len()` bytes from `password` and `salt`.
    ///
    /// CPU and memory bound; callers must not hold locks across this call.
    pub fn derive(&self, password: &[u8], salt: &[u8], out: &mut [u8]) -> Result<(), ScryptError> {
        let log_n = self.n.trailing_zeros() as u8;
        let params = scrypt::Params::new(log_n, self.r, self.p, out.len())
            .map_err(|e| ScryptError::Rejected(e.to_string()))?;
        scrypt::scrypt(password, salt, &params, out)
            .map_err(|e| ScryptError::Rejected(e.to_string()))
    }
}
