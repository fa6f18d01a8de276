//! Salted content hashes for change detection.
//!
//! A key status stores `bcrypt(base64(sha256(value)))`. The digest keeps the
//! bcrypt input under its 72 byte limit for values of any size; the salt
//! means equal values never share a stored hash.

use crate::errors::Result;
use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};

/// Hashes secret values with a fixed bcrypt cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentHasher {
    cost: u32,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self { cost: bcrypt::DEFAULT_COST }
    }
}

impl ContentHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Salted one-way hash of a secret value
    pub fn hash(&self, value: &[u8]) -> Result<String> {
        Ok(bcrypt::hash(digest(value), self.cost)?)
    }

    /// Whether `hash` was produced from `value`. Malformed hashes never verify.
    pub fn verify(&self, value: &[u8], hash: &str) -> bool {
        bcrypt::verify(digest(value), hash).unwrap_or(false)
    }

    /// bcrypt of a password, as emitted for `format: bcrypt` and htpasswd lines
    pub fn bcrypt_password(&self, password: &str) -> Result<String> {
        Ok(bcrypt::hash(password, self.cost)?)
    }
}

fn digest(value: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(value))
}
