// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token → active account.

use std::sync::Arc;
use std::time::Duration;

use super::error::{AuthError, ErrorKind};
use super::token::TokenCodec;
use crate::cache::{read_json, spawn_populate, user_key, Cache};
use crate::storage::{Account, AccountId, AccountRepository, StoreError};

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively; an empty token counts as absent.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let (scheme, token) = header?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves bearer tokens into verified, active accounts.
///
/// Account snapshots are memoized under `user:<id>` for the configured TTL.
/// A deactivation therefore takes effect once the snapshot expires, or
/// immediately after [`Authenticator::evict`].
pub struct Authenticator {
    access_codec: TokenCodec,
    accounts: Arc<dyn AccountRepository>,
    cache: Arc<dyn Cache>,
    cache_ttl: Duration,
}

impl Authenticator {
    pub fn new(
        access_codec: TokenCodec,
        accounts: Arc<dyn AccountRepository>,
        cache: Arc<dyn Cache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            access_codec,
            accounts,
            cache,
            cache_ttl,
        }
    }

    /// Authenticate the raw `Authorization` header value.
    #[tracing::instrument(name = "auth.authenticate", skip_all)]
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Account, AuthError> {
        let token = bearer_token(authorization).ok_or_else(|| {
            AuthError::new(ErrorKind::AuthenticationNotFound, "missing bearer token")
        })?;

        let claims = self.access_codec.validate(token).map_err(|e| {
            tracing::debug!(error = %e, "access token rejected");
            e
        })?;

        let account = self.resolve_account(claims.account_id).await?;

        if !account.active {
            tracing::info!(account_id = %account.id, "inactive account attempted to authenticate");
            return Err(AuthError::new(ErrorKind::UserNotActive, "account is not active")
                .with_detail("account_id", account.id.to_string()));
        }

        Ok(account)
    }

    /// Drop the cached snapshot for `id`. Best-effort.
    pub async fn evict(&self, id: AccountId) {
        let key = user_key(id);
        if let Err(e) = self.cache.del(&key).await {
            tracing::warn!(key = %key, error = %e, "failed to evict cached account");
        }
    }

    async fn resolve_account(&self, id: AccountId) -> Result<Account, AuthError> {
        let key = user_key(id);

        if let Some(account) = read_json::<Account>(self.cache.as_ref(), &key).await {
            if account.id == id {
                return Ok(account);
            }
            tracing::warn!(key = %key, cached_id = %account.id, "cached account does not match key");
        }

        let account = self.accounts.find(id).await.map_err(|e| match e {
            StoreError::NotFound(_) => {
                AuthError::not_found("account not found").with_detail("account_id", id.to_string())
            }
            other => {
                tracing::error!(account_id = %id, error = %other, "account lookup failed");
                AuthError::dependency("failed to find account", other)
                    .with_detail("account_id", id.to_string())
                    .with_detail("operation", "find_account")
            }
        })?;

        // Detached; the response never waits on the cache write
        let _ = spawn_populate(Arc::clone(&self.cache), key, account.clone(), self.cache_ttl);

        Ok(account)
    }
}
