// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Collaborator fakes shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::password::{HashError, PasswordHasher};
use crate::auth::permissions::Permission;
use crate::auth::{Role, TokenCodec, TokenCodecOptions};
use crate::cache::{Cache, CacheError, InMemoryCache};
use crate::config::AuthSettings;
use crate::state::AppState;
use crate::storage::{
    normalize_email, Account, AccountId, AccountRepository, FixedPermissionTable,
    InMemoryAccountRepository, PermissionRepository, StoreError, StoreResult,
};

pub fn auth_settings() -> AuthSettings {
    AuthSettings {
        access_token_secret: "test-access-secret".to_string(),
        refresh_token_secret: "test-refresh-secret".to_string(),
        issuer: "tenant-auth-server".to_string(),
        audience: "tenant-api".to_string(),
        access_token_duration: Duration::from_secs(900),
        refresh_token_duration: Duration::from_secs(3600),
        user_cache_ttl: Duration::from_secs(300),
        role_permissions_cache_ttl: Duration::from_secs(3600),
        min_password_length: 8,
        password_hash_cost: 4,
    }
}

pub fn access_codec() -> TokenCodec {
    let settings = auth_settings();
    TokenCodec::new(TokenCodecOptions {
        issuer: settings.issuer,
        audience: settings.audience,
        secret: settings.access_token_secret,
    })
}

pub fn refresh_codec() -> TokenCodec {
    let settings = auth_settings();
    TokenCodec::new(TokenCodecOptions {
        issuer: settings.issuer,
        audience: settings.audience,
        secret: settings.refresh_token_secret,
    })
}

/// Fully wired state over in-memory collaborators and the built-in
/// permission table.
pub fn test_state() -> AppState {
    AppState::new(
        &auth_settings(),
        Arc::new(InMemoryAccountRepository::new()),
        Arc::new(FixedPermissionTable::new()),
        Arc::new(InMemoryCache::new(64)),
        Arc::new(RecordingHasher::new()),
    )
}

pub fn account(role: Role, active: bool) -> Account {
    let mut account = Account::new(
        AccountId::generate(),
        "Ada Lovelace",
        "user@email.com",
        "hashed:password".to_string(),
        role,
    )
    .expect("valid account");
    account.active = active;
    account
}

fn backend_error() -> StoreError {
    StoreError::Backend(Box::new(std::io::Error::other("connection refused")))
}

// =============================================================================
// Accounts
// =============================================================================

/// Call-counting account repository.
#[derive(Default)]
pub struct FakeAccounts {
    accounts: Mutex<Vec<Account>>,
    failing: AtomicBool,
    find_calls: AtomicUsize,
    find_by_email_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl FakeAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(accounts: impl IntoIterator<Item = Account>) -> Self {
        let fake = Self::new();
        fake.accounts.lock().unwrap().extend(accounts);
        fake
    }

    /// Every call fails with a backend error.
    pub fn failing(self) -> Self {
        self.failing.store(true, Ordering::SeqCst);
        self
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn find_by_email_calls(&self) -> usize {
        self.find_by_email_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountRepository for FakeAccounts {
    async fn find(&self, id: AccountId) -> StoreResult<Account> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(backend_error());
        }
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Account> {
        self.find_by_email_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(backend_error());
        }
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| normalize_email(&a.email) == normalize_email(email))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(email.to_string()))
    }

    async fn create(&self, account: &Account) -> StoreResult<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(backend_error());
        }
        self.accounts.lock().unwrap().push(account.clone());
        Ok(())
    }

    async fn list(&self, offset: usize, limit: usize) -> StoreResult<(Vec<Account>, usize)> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(backend_error());
        }
        let accounts = self.accounts.lock().unwrap();
        let page = accounts.iter().skip(offset).take(limit).cloned().collect();
        Ok((page, accounts.len()))
    }

    async fn update(&self, account: &Account) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(backend_error());
        }
        let mut accounts = self.accounts.lock().unwrap();
        let slot = accounts
            .iter_mut()
            .find(|a| a.id == account.id)
            .ok_or_else(|| StoreError::NotFound(account.id.to_string()))?;
        *slot = account.clone();
        Ok(())
    }

    async fn delete(&self, id: AccountId) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(backend_error());
        }
        let mut accounts = self.accounts.lock().unwrap();
        let before = accounts.len();
        accounts.retain(|a| a.id != id);
        if accounts.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Permissions
// =============================================================================

/// Call-counting permission table.
pub struct FakePermissions {
    table: FixedPermissionTable,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakePermissions {
    pub fn new(entries: impl IntoIterator<Item = (Role, Vec<Permission>)>) -> Self {
        Self {
            table: FixedPermissionTable::from_map(entries.into_iter().collect()),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn builtin() -> Self {
        Self {
            table: FixedPermissionTable::new(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(self) -> Self {
        self.failing.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionRepository for FakePermissions {
    async fn find_permissions(&self, role: Role) -> StoreResult<Vec<Permission>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(backend_error());
        }
        self.table.find_permissions(role).await
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Map-backed cache whose reads and writes can be made to fail.
#[derive(Default)]
pub struct ScriptedCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    fail_reads: bool,
    fail_writes: bool,
    get_calls: AtomicUsize,
    set_calls: AtomicUsize,
}

impl ScriptedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Seed an entry, bypassing the failure switches.
    pub fn put_raw(&self, key: &str, value: &[u8]) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
    }

    pub fn put_json<T: serde::Serialize>(&self, key: &str, value: &T) {
        self.put_raw(key, &serde_json::to_vec(value).unwrap());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    /// Poll until a detached population task has written `key`.
    pub async fn wait_for(&self, key: &str) {
        for _ in 0..200 {
            if self.contains(key) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("cache key {key} was never populated");
    }

    /// Poll until `count` writes have been attempted.
    pub async fn wait_for_sets(&self, count: usize) {
        for _ in 0..200 {
            if self.set_calls() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {count} cache writes, saw {}", self.set_calls());
    }
}

#[async_trait]
impl Cache for ScriptedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(CacheError::Backend("read timeout".to_string()));
        }
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(CacheError::Backend("write timeout".to_string()));
        }
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        if self.fail_writes {
            return Err(CacheError::Backend("write timeout".to_string()));
        }
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

// =============================================================================
// Password hashing
// =============================================================================

/// Deterministic hasher: `hash(p) == "hashed:" + p`.
#[derive(Default)]
pub struct RecordingHasher {
    hash_calls: AtomicUsize,
    verify_inputs: Mutex<Vec<String>>,
}

impl RecordingHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn digest(plain: &str) -> String {
        format!("hashed:{plain}")
    }

    pub fn hash_calls(&self) -> usize {
        self.hash_calls.load(Ordering::SeqCst)
    }

    pub fn verify_inputs(&self) -> Vec<String> {
        self.verify_inputs.lock().unwrap().clone()
    }
}

impl PasswordHasher for RecordingHasher {
    fn hash(&self, plain: &str) -> Result<String, HashError> {
        self.hash_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::digest(plain))
    }

    fn verify(&self, digest: &str, plain: &str) -> Result<bool, HashError> {
        self.verify_inputs.lock().unwrap().push(plain.to_string());
        if !digest.starts_with("hashed:") {
            return Err(HashError::Bcrypt(bcrypt::BcryptError::InvalidHash(
                digest.to_string(),
            )));
        }
        Ok(digest == Self::digest(plain))
    }
}
