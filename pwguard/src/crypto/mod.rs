//! Central password-hashing module. Salt generation, the hashing primitives,
//! and the caller-facing operations each live in their own submodule so the
//! security model stays simple and auditable.

pub mod passwords;
pub mod salt;
pub mod scheme;
