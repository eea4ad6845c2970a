// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Accounts and the account repository.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::auth::error::{AuthError, FieldErrors};
use crate::auth::Role;
use crate::models::is_valid_email;

/// Opaque account identifier (UUID v4).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A registered account.
///
/// Serialized as-is into cache snapshots, password hash included. API
/// responses go through [`crate::models::AccountResponse`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Build a new active account, trimming name and email.
    pub fn new(
        id: AccountId,
        name: &str,
        email: &str,
        password_hash: String,
        role: Role,
    ) -> Result<Self, AuthError> {
        let name = name.trim();
        let email = email.trim();

        let mut errors = FieldErrors::new();
        if name.is_empty() {
            errors.add("name", "required");
        }
        if !is_valid_email(email) {
            errors.add("email", "invalid email");
        }
        if password_hash.is_empty() {
            errors.add("password_hash", "required");
        }
        errors.into_result()?;

        Ok(Self {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            active: true,
            role,
            created_at: Utc::now(),
        })
    }
}

/// Canonical form used for email lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Account persistence collaborator.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find(&self, id: AccountId) -> StoreResult<Account>;

    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> StoreResult<Account>;

    /// Fails with [`StoreError::AlreadyExists`] when the id or email is taken.
    async fn create(&self, account: &Account) -> StoreResult<()>;

    /// One page of accounts ordered by creation time, plus the total count.
    async fn list(&self, offset: usize, limit: usize) -> StoreResult<(Vec<Account>, usize)>;

    /// Replace the stored account with the same id.
    ///
    /// Fails with [`StoreError::NotFound`] when the id is unknown and with
    /// [`StoreError::AlreadyExists`] when the new email belongs to another
    /// account.
    async fn update(&self, account: &Account) -> StoreResult<()>;

    async fn delete(&self, id: AccountId) -> StoreResult<()>;
}

/// Stable listing order: oldest first, id as tie-breaker.
pub(crate) fn sort_for_listing(accounts: &mut [Account]) {
    accounts.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
}

/// Cut one page out of an already sorted listing.
pub(crate) fn page_of(accounts: Vec<Account>, offset: usize, limit: usize) -> (Vec<Account>, usize) {
    let total = accounts.len();
    let page = accounts.into_iter().skip(offset).take(limit).collect();
    (page, total)
}

#[derive(Default)]
struct AccountIndex {
    by_id: HashMap<AccountId, Account>,
    by_email: HashMap<String, AccountId>,
}

/// Process-local account store.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    inner: RwLock<AccountIndex>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find(&self, id: AccountId) -> StoreResult<Account> {
        self.inner
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("account {id}")))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Account> {
        let index = self.inner.read().await;
        index
            .by_email
            .get(&normalize_email(email))
            .and_then(|id| index.by_id.get(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("account with email {email}")))
    }

    async fn create(&self, account: &Account) -> StoreResult<()> {
        let email = normalize_email(&account.email);
        let mut index = self.inner.write().await;

        if index.by_id.contains_key(&account.id) {
            return Err(StoreError::AlreadyExists(format!("account {}", account.id)));
        }
        if index.by_email.contains_key(&email) {
            return Err(StoreError::AlreadyExists(format!(
                "account with email {}",
                account.email
            )));
        }

        index.by_email.insert(email, account.id);
        index.by_id.insert(account.id, account.clone());
        Ok(())
    }

    async fn list(&self, offset: usize, limit: usize) -> StoreResult<(Vec<Account>, usize)> {
        let mut accounts: Vec<Account> = self.inner.read().await.by_id.values().cloned().collect();
        sort_for_listing(&mut accounts);
        Ok(page_of(accounts, offset, limit))
    }

    async fn update(&self, account: &Account) -> StoreResult<()> {
        let email = normalize_email(&account.email);
        let mut index = self.inner.write().await;

        let Some(previous) = index.by_id.get(&account.id) else {
            return Err(StoreError::NotFound(format!("account {}", account.id)));
        };
        let previous_email = normalize_email(&previous.email);

        if previous_email != email {
            if index.by_email.contains_key(&email) {
                return Err(StoreError::AlreadyExists(format!(
                    "account with email {}",
                    account.email
                )));
            }
            index.by_email.remove(&previous_email);
            index.by_email.insert(email, account.id);
        }

        index.by_id.insert(account.id, account.clone());
        Ok(())
    }

    async fn delete(&self, id: AccountId) -> StoreResult<()> {
        let mut index = self.inner.write().await;
        let removed = index
            .by_id
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;
        index.by_email.remove(&normalize_email(&removed.email));
        Ok(())
    }
}
