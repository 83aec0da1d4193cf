//! One-way password digests.
//!
//! Passwords are stored as Argon2id PHC strings: algorithm, parameters, salt
//! and hash in one self-describing value.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher as _, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password cannot be empty")]
    Empty,
    #[error("Failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),
}

#[derive(Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Digests `password` with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::Empty);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(PasswordError::Hash)?;

        Ok(hash.to_string())
    }
}
