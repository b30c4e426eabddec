//! Adaptive hashing primitives behind a single capability trait.
//! `Passwords` only talks to `AdaptiveHash`, so bcrypt and Argon2id can be
//! swapped without touching the hashing, verification, or rehash logic.

use std::ops::RangeInclusive;

use argon2::password_hash::{PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use super::passwords::PasswordError;
use super::salt::SALT_LEN;

/// Capability interface over an adaptive password-hashing primitive.
pub trait AdaptiveHash: Send + Sync {
    /// Short identifier used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Cost factors the primitive accepts.
    fn cost_range(&self) -> RangeInclusive<u32>;

    /// Longest password the primitive processes without truncation, if bounded.
    fn max_password_len(&self) -> Option<usize>;

    /// Hashes `password` at `cost` using the caller-supplied `salt` and returns
    /// the encoded string (version, cost, salt and digest together).
    fn hash(&self, password: &[u8], cost: u32, salt: [u8; SALT_LEN]) -> Result<String, PasswordError>;

    /// Constant-time check of `password` against `encoded`. Malformed input is `false`.
    fn verify(&self, encoded: &str, password: &[u8]) -> bool;

    /// Cost factor embedded in `encoded`, or `None` when it cannot be parsed.
    fn extract_cost(&self, encoded: &str) -> Option<u32>;

    /// Whether `encoded` uses the exact format and fixed parameters this
    /// primitive produces today.
    fn is_current_format(&self, encoded: &str) -> bool;
}

const BCRYPT_MIN_COST: u32 = 4;
const BCRYPT_MAX_COST: u32 = 31;
const BCRYPT_MAX_PASSWORD_LEN: usize = 72;
const BCRYPT_ENCODED_TAIL_LEN: usize = 53;
const BCRYPT_CURRENT_VERSION: &str = "2b";
const BCRYPT_KNOWN_VERSIONS: [&str; 4] = ["2a", "2b", "2x", "2y"];

/// bcrypt in modular crypt format (`$2b$<cost>$<salt+digest>`).
/// The cost factor is the base-2 logarithm of the key expansion rounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bcrypt;

impl Bcrypt {
    /// Splits `$<version>$<cost>$<tail>` into version and cost.
    fn parse_header(encoded: &str) -> Option<(&str, u32)> {
        let mut parts = encoded.split('$');
        if !parts.next()?.is_empty() {
            return None;
        }
        let version = parts.next()?;
        let cost = parts.next()?;
        let tail = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        if !BCRYPT_KNOWN_VERSIONS.contains(&version) {
            return None;
        }
        if cost.len() != 2 || !cost.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if tail.len() != BCRYPT_ENCODED_TAIL_LEN {
            return None;
        }
        Some((version, cost.parse().ok()?))
    }
}

impl AdaptiveHash for Bcrypt {
    fn name(&self) -> &'static str {
        "bcrypt"
    }

    fn cost_range(&self) -> RangeInclusive<u32> {
        BCRYPT_MIN_COST..=BCRYPT_MAX_COST
    }

    fn max_password_len(&self) -> Option<usize> {
        Some(BCRYPT_MAX_PASSWORD_LEN)
    }

    fn hash(&self, password: &[u8], cost: u32, salt: [u8; SALT_LEN]) -> Result<String, PasswordError> {
        let parts = bcrypt::hash_with_salt(password, cost, salt)
            .map_err(|e| PasswordError::Hashing(format!("{e}")))?;
        Ok(parts.format_for_version(bcrypt::Version::TwoB))
    }

    fn verify(&self, encoded: &str, password: &[u8]) -> bool {
        if Self::parse_header(encoded).is_none() {
            return false;
        }
        bcrypt::verify(password, encoded).unwrap_or(false)
    }

    fn extract_cost(&self, encoded: &str) -> Option<u32> {
        Self::parse_header(encoded).map(|(_, cost)| cost)
    }

    fn is_current_format(&self, encoded: &str) -> bool {
        matches!(Self::parse_header(encoded), Some((BCRYPT_CURRENT_VERSION, _)))
    }
}

/// Memory cost in KiB: 19 MiB keeps GPU cracking expensive while staying server friendly.
pub const ARGON2_DEFAULT_MEMORY_KIB: u32 = 19 * 1024;
/// One lane keeps resource usage predictable on shared hosts.
pub const ARGON2_DEFAULT_PARALLELISM: u32 = 1;
/// Highest time cost accepted for hashing or verification.
pub const ARGON2_MAX_TIME_COST: u32 = 64;

/// Argon2id (version 0x13) in PHC string format. The cost factor maps to the
/// time cost (`t=`); memory and parallelism are fixed per instance.
#[derive(Debug, Clone, Copy)]
pub struct Argon2id {
    memory_kib: u32,
    parallelism: u32,
}

impl Argon2id {
    pub fn new(memory_kib: u32, parallelism: u32) -> Self {
        Self { memory_kib, parallelism }
    }

    pub fn memory_kib(&self) -> u32 {
        self.memory_kib
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    fn parse(encoded: &str) -> Option<(PhcHash<'_>, Params)> {
        let parsed = PhcHash::new(encoded).ok()?;
        if !parsed.algorithm.as_str().starts_with("argon2") {
            return None;
        }
        let params = Params::try_from(&parsed).ok()?;
        Some((parsed, params))
    }
}

impl Default for Argon2id {
    fn default() -> Self {
        Self::new(ARGON2_DEFAULT_MEMORY_KIB, ARGON2_DEFAULT_PARALLELISM)
    }
}

impl AdaptiveHash for Argon2id {
    fn name(&self) -> &'static str {
        "argon2id"
    }

    fn cost_range(&self) -> RangeInclusive<u32> {
        1..=ARGON2_MAX_TIME_COST
    }

    fn max_password_len(&self) -> Option<usize> {
        None
    }

    fn hash(&self, password: &[u8], cost: u32, salt: [u8; SALT_LEN]) -> Result<String, PasswordError> {
        let params = Params::new(self.memory_kib, cost, self.parallelism, None)
            .map_err(|e| PasswordError::InvalidConfiguration(format!("argon2 parameters rejected: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::encode_b64(&salt).map_err(|e| PasswordError::Hashing(format!("{e}")))?;
        let hash = argon2
            .hash_password(password, &salt)
            .map_err(|e| PasswordError::Hashing(format!("{e}")))?;
        Ok(hash.to_string())
    }

    fn verify(&self, encoded: &str, password: &[u8]) -> bool {
        let Some((parsed, params)) = Self::parse(encoded) else {
            return false;
        };
        // Embedded parameters are attacker-controlled; never spend more than
        // this instance would on its own hashes.
        if params.m_cost() > self.memory_kib
            || params.p_cost() > self.parallelism
            || params.t_cost() > ARGON2_MAX_TIME_COST
        {
            return false;
        }
        Argon2::default().verify_password(password, &parsed).is_ok()
    }

    fn extract_cost(&self, encoded: &str) -> Option<u32> {
        Self::parse(encoded).map(|(_, params)| params.t_cost())
    }

    fn is_current_format(&self, encoded: &str) -> bool {
        match Self::parse(encoded) {
            Some((parsed, params)) => {
                parsed.algorithm.as_str() == "argon2id"
                    && parsed.version == Some(Version::V0x13 as u32)
                    && params.m_cost() == self.memory_kib
                    && params.p_cost() == self.parallelism
                    && params.t_cost() <= ARGON2_MAX_TIME_COST
            }
            None => false,
        }
    }
}
