// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence collaborators consumed by the auth core.
//!
//! ## Layout
//!
//! - `accounts`: account model, [`AccountRepository`] and the in-memory store
//! - `account_db`: redb-backed [`AccountRepository`] for `DATA_DIR` deployments
//! - `permissions`: [`PermissionRepository`] and the static role table
//!
//! Every repository reports a missing entity as [`StoreError::NotFound`] so
//! callers can tell it apart from backend failures with an exhaustive match.

pub mod account_db;
pub mod accounts;
pub mod permissions;

pub use account_db::{AccountDbError, RedbAccountRepository};
pub use accounts::{normalize_email, Account, AccountId, AccountRepository, InMemoryAccountRepository};
pub use permissions::{FixedPermissionTable, PermissionRepository};

use crate::auth::error::BoxError;

/// Errors reported by storage collaborators.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("storage backend error: {0}")]
    Backend(#[source] BoxError),
}

pub type StoreResult<T> = Result<T, StoreError>;
