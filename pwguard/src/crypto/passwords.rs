//! Password hashing, verification, and rehash detection.
//! The target cost factor is bound into each `Passwords` instance, so several
//! configurations can live side by side without any shared mutable state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::salt::generate_salt;
use super::scheme::{AdaptiveHash, Bcrypt};

/// Cost factor used when nothing else is configured.
pub const DEFAULT_COST: u32 = 10;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("secure random source failed: {0}")]
    Entropy(String),
    #[error("cost factor {cost} outside accepted range {min}..={max}")]
    InvalidCost { cost: u32, min: u32, max: u32 },
    #[error("invalid hashing configuration: {0}")]
    InvalidConfiguration(String),
    #[error("password is {len} bytes; at most {max} bytes can be hashed")]
    InputTooLarge { len: usize, max: usize },
    #[error("hashing failed: {0}")]
    Hashing(String),
}

/// Encoded password hash carrying the scheme version, cost factor, salt, and
/// digest. Safe to persist; serializes as a plain string.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Hash material never appears in debug output.
impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

impl From<String> for PasswordHash {
    fn from(encoded: String) -> Self {
        Self(encoded)
    }
}

impl From<&str> for PasswordHash {
    fn from(encoded: &str) -> Self {
        Self(encoded.to_owned())
    }
}

impl FromStr for PasswordHash {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Salts, hashes, and verifies passwords with one adaptive hashing scheme at a
/// fixed target cost.
pub struct Passwords {
    scheme: Box<dyn AdaptiveHash>,
    cost: u32,
}

impl Passwords {
    /// bcrypt at the given target cost.
    pub fn new(cost: u32) -> Self {
        Self::with_scheme(Bcrypt, cost)
    }

    pub fn with_scheme(scheme: impl AdaptiveHash + 'static, cost: u32) -> Self {
        Self {
            scheme: Box::new(scheme),
            cost,
        }
    }

    /// Target cost factor new hashes are produced with.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn scheme_name(&self) -> &'static str {
        self.scheme.name()
    }

    /// Hashes `password` under a fresh random salt at the configured cost.
    /// Hashing the same password twice yields two different encodings.
    pub fn hash_password(&self, password: &[u8]) -> Result<PasswordHash, PasswordError> {
        let range = self.scheme.cost_range();
        if !range.contains(&self.cost) {
            return Err(PasswordError::InvalidCost {
                cost: self.cost,
                min: *range.start(),
                max: *range.end(),
            });
        }
        if let Some(max) = self.scheme.max_password_len() {
            if password.len() > max {
                return Err(PasswordError::InputTooLarge {
                    len: password.len(),
                    max,
                });
            }
        }

        let salt = generate_salt()?;
        let encoded = self.scheme.hash(password, self.cost, salt)?;
        debug!(scheme = self.scheme.name(), cost = self.cost, "password hashed");
        Ok(PasswordHash(encoded))
    }

    /// Same as [`Passwords::hash_password`] over the UTF-8 bytes of `password`.
    pub fn hash_password_str(&self, password: &str) -> Result<PasswordHash, PasswordError> {
        self.hash_password(password.as_bytes())
    }

    /// Returns `true` only when `password` reproduces the digest in `hash`.
    /// Wrong passwords, malformed or foreign hashes, and oversized input all
    /// come back as `false`; the reason is never exposed.
    pub fn verify_password(&self, hash: &PasswordHash, password: &[u8]) -> bool {
        if let Some(max) = self.scheme.max_password_len() {
            if password.len() > max {
                return false;
            }
        }
        let matches = self.scheme.verify(hash.as_str(), password);
        if !matches {
            debug!(scheme = self.scheme.name(), "password verification failed");
        }
        matches
    }

    pub fn verify_password_str(&self, hash: &PasswordHash, password: &str) -> bool {
        self.verify_password(hash, password.as_bytes())
    }

    /// Whether `hash` was produced under weaker settings than the current
    /// configuration: an embedded cost below the target, an outdated format
    /// version or fixed parameters, or a cost that cannot be read at all.
    pub fn needs_rehash(&self, hash: &PasswordHash) -> bool {
        let encoded = hash.as_str();
        let Some(embedded) = self.scheme.extract_cost(encoded) else {
            warn!(scheme = self.scheme.name(), "unreadable cost factor; treating hash as stale");
            return true;
        };
        if embedded < self.cost {
            debug!(scheme = self.scheme.name(), embedded, target = self.cost, "cost below target");
            return true;
        }
        if !self.scheme.is_current_format(encoded) {
            debug!(scheme = self.scheme.name(), "hash format outdated");
            return true;
        }
        false
    }
}

impl Default for Passwords {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl fmt::Debug for Passwords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Passwords")
            .field("scheme", &self.scheme.name())
            .field("cost", &self.cost)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{PasswordError, PasswordHash, Passwords, DEFAULT_COST};
    use crate::crypto::scheme::Argon2id;

    #[test]
    fn hashes_and_verifies_passwords() {
        let passwords = Passwords::new(4);
        let hash = passwords
            .hash_password(b"pwguard-test-password")
            .expect("hashing should succeed");
        assert!(passwords.verify_password(&hash, b"pwguard-test-password"));
        assert!(!passwords.verify_password(&hash, b"wrong-password"));
    }

    #[test]
    fn default_cost_is_ten() {
        let passwords = Passwords::default();
        assert_eq!(passwords.cost(), DEFAULT_COST);
        assert_eq!(passwords.cost(), 10);
        assert_eq!(passwords.scheme_name(), "bcrypt");
    }

    #[test]
    fn rejects_cost_outside_range_at_hash_time() {
        for cost in [0, 3, 32] {
            let err = Passwords::new(cost).hash_password(b"pw").unwrap_err();
            assert!(
                matches!(err, PasswordError::InvalidCost { cost: c, min: 4, max: 31 } if c == cost),
                "cost {cost}: {err}"
            );
        }

        let argon2 = Passwords::with_scheme(Argon2id::new(1024, 1), 65);
        let err = argon2.hash_password(b"pw").unwrap_err();
        assert!(matches!(err, PasswordError::InvalidCost { cost: 65, min: 1, max: 64 }));
        assert!(format!("{err}").contains("outside accepted range 1..=64"));
    }

    #[test]
    fn rejects_oversized_input_instead_of_truncating() {
        let passwords = Passwords::new(4);
        let long = vec![b'a'; 73];
        let err = passwords.hash_password(&long).unwrap_err();
        assert!(matches!(err, PasswordError::InputTooLarge { len: 73, max: 72 }));

        let at_limit = passwords
            .hash_password(&long[..72])
            .expect("72 bytes is within bcrypt's limit");
        assert!(passwords.verify_password(&at_limit, &long[..72]));
        assert!(!passwords.verify_password(&at_limit, &long));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        let passwords = Passwords::new(4);
        for bogus in ["", "not-a-hash", "$2b$04$short", "$argon2id$v=19$garbage"] {
            assert!(!passwords.verify_password(&PasswordHash::from(bogus), b"pw"));
            assert!(passwords.needs_rehash(&PasswordHash::from(bogus)));
        }
    }

    #[test]
    fn higher_cost_hashes_are_not_stale() {
        let strong = Passwords::new(5).hash_password(b"pw").expect("hashing should succeed");
        assert!(!Passwords::new(4).needs_rehash(&strong));
        assert!(!Passwords::new(5).needs_rehash(&strong));
        assert!(Passwords::new(6).needs_rehash(&strong));
    }

    #[test]
    fn legacy_bcrypt_version_needs_rehash() {
        let passwords = Passwords::new(4);
        let hash = passwords.hash_password(b"pw").expect("hashing should succeed");
        let legacy = PasswordHash::from(hash.as_str().replacen("$2b$", "$2y$", 1));
        assert!(passwords.verify_password(&legacy, b"pw"));
        assert!(passwords.needs_rehash(&legacy));
    }

    #[test]
    fn argon2_scheme_tracks_time_cost() {
        let weak = Passwords::with_scheme(Argon2id::new(1024, 1), 1);
        let target = Passwords::with_scheme(Argon2id::new(1024, 1), 2);
        let hash = weak.hash_password_str("pw").expect("hashing should succeed");
        assert!(target.verify_password_str(&hash, "pw"));
        assert!(target.needs_rehash(&hash));
        assert!(!weak.needs_rehash(&hash));
    }

    #[test]
    fn argon2_hash_demanding_huge_memory_fails_closed() {
        let passwords = Passwords::with_scheme(Argon2id::new(1024, 1), 1);
        let hash = passwords.hash_password(b"pw").expect("hashing should succeed");
        let inflated = PasswordHash::from(hash.as_str().replacen("m=1024", "m=268435455", 1));
        assert!(!passwords.verify_password(&inflated, b"pw"));
        assert!(passwords.needs_rehash(&inflated));
    }

    #[test]
    fn argon2_rejects_invalid_memory_setting() {
        let passwords = Passwords::with_scheme(Argon2id::new(1, 1), 1);
        let err = passwords.hash_password(b"pw").unwrap_err();
        assert!(matches!(err, PasswordError::InvalidConfiguration(_)));
    }

    #[test]
    fn debug_output_hides_hash_material() {
        let hash = Passwords::new(4).hash_password(b"pw").expect("hashing should succeed");
        assert_eq!(format!("{hash:?}"), "PasswordHash(<redacted>)");
        assert!(format!("{hash}").starts_with("$2b$04$"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let hash = PasswordHash::from("$2b$04$abc");
        assert_eq!(serde_json::to_string(&hash).unwrap(), "\"$2b$04$abc\"");
        let back: PasswordHash = serde_json::from_str("\"$2b$04$abc\"").unwrap();
        assert_eq!(back, hash);
    }
}
