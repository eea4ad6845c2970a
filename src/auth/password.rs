// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing.
//!
//! Hashes are computed over [`salted_secret`], never over the raw password,
//! so two accounts sharing a password still store unrelated digests.
//!
//! bcrypt only reads the first [`MAX_SECRET_BYTES`] of its input. Longer
//! inputs are rejected rather than truncated.

use bcrypt::BcryptError;
use thiserror::Error;

use crate::storage::AccountId;

/// Largest hash input bcrypt consumes.
pub const MAX_SECRET_BYTES: usize = 72;

/// Errors from a [`PasswordHasher`].
#[derive(Debug, Error)]
pub enum HashError {
    #[error("input is {0} bytes, at most {MAX_SECRET_BYTES} are accepted")]
    TooLong(usize),

    #[error("bcrypt error: {0}")]
    Bcrypt(BcryptError),
}

impl From<BcryptError> for HashError {
    fn from(err: BcryptError) -> Self {
        match err {
            BcryptError::Truncation(len) => HashError::TooLong(len),
            other => HashError::Bcrypt(other),
        }
    }
}

/// One-way credential hashing.
///
/// Implementations are CPU-bound; async callers run them on
/// `tokio::task::spawn_blocking`.
pub trait PasswordHasher: Send + Sync + 'static {
    fn hash(&self, plain: &str) -> Result<String, HashError>;

    /// `Ok(false)` on mismatch; `Err` only when the comparison itself fails.
    fn verify(&self, digest: &str, plain: &str) -> Result<bool, HashError>;
}

/// bcrypt-backed [`PasswordHasher`].
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> Result<String, HashError> {
        Ok(bcrypt::non_truncating_hash(plain, self.cost)?)
    }

    fn verify(&self, digest: &str, plain: &str) -> Result<bool, HashError> {
        Ok(bcrypt::non_truncating_verify(plain, digest)?)
    }
}

/// Compose the hash input `"<account_id>:<password>"`.
pub fn salted_secret(account_id: AccountId, password: &str) -> String {
    format!("{account_id}:{password}")
}
