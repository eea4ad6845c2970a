// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded account database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `accounts`: account id → serialized [`Account`] (JSON bytes)
//! - `accounts_by_email`: lower-cased email → account id
//!
//! redb calls block, so every repository method hops onto
//! `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::accounts::{
    normalize_email, page_of, sort_for_listing, Account, AccountId, AccountRepository,
};
use super::{StoreError, StoreResult};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: account id → serialized Account (JSON bytes).
const ACCOUNTS: TableDefinition<&str, &[u8]> = TableDefinition::new("accounts");

/// Unique index: normalized email → account id.
const ACCOUNTS_BY_EMAIL: TableDefinition<&str, &str> = TableDefinition::new("accounts_by_email");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AccountDbError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

pub type AccountDbResult<T> = Result<T, AccountDbError>;

impl From<AccountDbError> for StoreError {
    fn from(err: AccountDbError) -> Self {
        match err {
            AccountDbError::NotFound(what) => StoreError::NotFound(what),
            AccountDbError::Conflict(what) => StoreError::AlreadyExists(what),
            other => StoreError::Backend(Box::new(other)),
        }
    }
}

// =============================================================================
// RedbAccountRepository
// =============================================================================

/// Durable [`AccountRepository`].
#[derive(Clone)]
pub struct RedbAccountRepository {
    db: Arc<Database>,
}

impl RedbAccountRepository {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> AccountDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ACCOUNTS)?;
            let _ = write_txn.open_table(ACCOUNTS_BY_EMAIL)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    fn get_account(db: &Database, id: &str) -> AccountDbResult<Account> {
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS)?;
        let account = match table.get(id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(AccountDbError::NotFound(format!("account {id}"))),
        };
        Ok(account)
    }

    fn get_account_by_email(db: &Database, email: &str) -> AccountDbResult<Account> {
        let read_txn = db.begin_read()?;
        let index = read_txn.open_table(ACCOUNTS_BY_EMAIL)?;
        let id = match index.get(normalize_email(email).as_str())? {
            Some(value) => value.value().to_string(),
            None => return Err(AccountDbError::NotFound(format!("account with email {email}"))),
        };
        Self::get_account(db, &id)
    }

    fn insert_account(db: &Database, account: &Account) -> AccountDbResult<()> {
        let id = account.id.to_string();
        let email = normalize_email(&account.email);
        let json = serde_json::to_vec(account)?;

        let write_txn = db.begin_write()?;
        {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut by_email = write_txn.open_table(ACCOUNTS_BY_EMAIL)?;

            if accounts.get(id.as_str())?.is_some() {
                return Err(AccountDbError::Conflict(format!("account {id}")));
            }
            if by_email.get(email.as_str())?.is_some() {
                return Err(AccountDbError::Conflict(format!(
                    "account with email {}",
                    account.email
                )));
            }

            accounts.insert(id.as_str(), json.as_slice())?;
            by_email.insert(email.as_str(), id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn all_accounts(db: &Database) -> AccountDbResult<Vec<Account>> {
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS)?;

        let mut accounts: Vec<Account> = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            accounts.push(serde_json::from_slice(value.value())?);
        }
        sort_for_listing(&mut accounts);
        Ok(accounts)
    }

    fn replace_account(db: &Database, account: &Account) -> AccountDbResult<()> {
        let id = account.id.to_string();
        let email = normalize_email(&account.email);
        let json = serde_json::to_vec(account)?;

        let write_txn = db.begin_write()?;
        {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut by_email = write_txn.open_table(ACCOUNTS_BY_EMAIL)?;

            let previous: Account = match accounts.get(id.as_str())? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(AccountDbError::NotFound(format!("account {id}"))),
            };
            let previous_email = normalize_email(&previous.email);

            if previous_email != email {
                let taken = by_email.get(email.as_str())?.is_some();
                if taken {
                    return Err(AccountDbError::Conflict(format!(
                        "account with email {}",
                        account.email
                    )));
                }
                by_email.remove(previous_email.as_str())?;
                by_email.insert(email.as_str(), id.as_str())?;
            }

            accounts.insert(id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove_account(db: &Database, id: &str) -> AccountDbResult<()> {
        let write_txn = db.begin_write()?;
        {
            let mut accounts = write_txn.open_table(ACCOUNTS)?;
            let mut by_email = write_txn.open_table(ACCOUNTS_BY_EMAIL)?;

            let removed: Account = match accounts.remove(id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(AccountDbError::NotFound(format!("account {id}"))),
            };
            by_email.remove(normalize_email(&removed.email).as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for RedbAccountRepository {
    async fn find(&self, id: AccountId) -> StoreResult<Account> {
        let db = Arc::clone(&self.db);
        let account = tokio::task::spawn_blocking(move || Self::get_account(&db, &id.to_string()))
            .await
            .map_err(AccountDbError::from)??;
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Account> {
        let db = Arc::clone(&self.db);
        let email = email.to_string();
        let account = tokio::task::spawn_blocking(move || Self::get_account_by_email(&db, &email))
            .await
            .map_err(AccountDbError::from)??;
        Ok(account)
    }

    async fn create(&self, account: &Account) -> StoreResult<()> {
        let db = Arc::clone(&self.db);
        let account = account.clone();
        tokio::task::spawn_blocking(move || Self::insert_account(&db, &account))
            .await
            .map_err(AccountDbError::from)??;
        Ok(())
    }

    async fn list(&self, offset: usize, limit: usize) -> StoreResult<(Vec<Account>, usize)> {
        let db = Arc::clone(&self.db);
        let accounts = tokio::task::spawn_blocking(move || Self::all_accounts(&db))
            .await
            .map_err(AccountDbError::from)??;
        Ok(page_of(accounts, offset, limit))
    }

    async fn update(&self, account: &Account) -> StoreResult<()> {
        let db = Arc::clone(&self.db);
        let account = account.clone();
        tokio::task::spawn_blocking(move || Self::replace_account(&db, &account))
            .await
            .map_err(AccountDbError::from)??;
        Ok(())
    }

    async fn delete(&self, id: AccountId) -> StoreResult<()> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || Self::remove_account(&db, &id.to_string()))
            .await
            .map_err(AccountDbError::from)??;
        Ok(())
    }
}
