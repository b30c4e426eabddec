//! Salt generation backed by the operating system RNG.

use rand::rngs::OsRng;
use rand::RngCore;

use super::passwords::PasswordError;

/// Length of every salt handed out by this crate: 128 bits.
pub const SALT_LEN: usize = 16;

/// Draws a fresh 128-bit salt from the OS secure random source.
/// An RNG failure is returned as an error; weaker randomness is never substituted.
pub fn generate_salt() -> Result<[u8; SALT_LEN], PasswordError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| PasswordError::Entropy(format!("{e}")))?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::{generate_salt, SALT_LEN};
    use std::collections::HashSet;

    #[test]
    fn every_salt_is_128_bits() {
        for _ in 0..256 {
            let salt = generate_salt().expect("os rng should be available");
            assert_eq!(salt.len(), SALT_LEN);
        }
    }

    #[test]
    fn salts_do_not_repeat() {
        let salts: HashSet<[u8; SALT_LEN]> = (0..64)
            .map(|_| generate_salt().expect("os rng should be available"))
            .collect();
        assert_eq!(salts.len(), 64);
    }
}
