//! Password salting, hashing, verification, and rehash detection on top of
//! bcrypt or Argon2id. Every operation is a synchronous function of its inputs
//! and the configuration bound into [`Passwords`].

pub mod config;
pub mod crypto;

pub use crypto::passwords::{PasswordError, PasswordHash, Passwords, DEFAULT_COST};
pub use crypto::salt::{generate_salt, SALT_LEN};
pub use crypto::scheme::{AdaptiveHash, Argon2id, Bcrypt};
