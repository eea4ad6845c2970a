// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Administrative account management: lookup, listing, updates and removal.
//!
//! Every write drops the account's cached snapshot so that a deactivation,
//! role change or deletion is seen by the next authenticated request.

use std::sync::Arc;

use super::authenticate::Authenticator;
use super::error::AuthError;
use crate::models::{AccountPage, ListAccountsQuery, UpdateAccountRequest};
use crate::storage::{Account, AccountId, AccountRepository, StoreError};

pub struct ClientService {
    accounts: Arc<dyn AccountRepository>,
    authenticator: Arc<Authenticator>,
}

impl ClientService {
    pub fn new(accounts: Arc<dyn AccountRepository>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            accounts,
            authenticator,
        }
    }

    #[tracing::instrument(name = "client.find", skip(self))]
    pub async fn find(&self, id: AccountId) -> Result<Account, AuthError> {
        self.accounts
            .find(id)
            .await
            .map_err(|e| store_error(e, id, "find_account"))
    }

    #[tracing::instrument(name = "client.list", skip_all)]
    pub async fn list(&self, query: ListAccountsQuery) -> Result<AccountPage, AuthError> {
        let (page, page_size) = query.validate()?;
        let offset = page.saturating_mul(page_size);

        let (accounts, total) = self.accounts.list(offset, page_size).await.map_err(|e| {
            tracing::error!(error = %e, "account listing failed");
            AuthError::dependency("failed to list accounts", e).with_detail("operation", "list_accounts")
        })?;

        Ok(AccountPage {
            accounts: accounts.into_iter().map(Into::into).collect(),
            total,
            pages: total.div_ceil(page_size),
        })
    }

    /// Apply the present fields of `request` and persist the result.
    #[tracing::instrument(name = "client.update", skip(self, request))]
    pub async fn update(
        &self,
        id: AccountId,
        request: UpdateAccountRequest,
    ) -> Result<Account, AuthError> {
        request.validate()?;

        let mut account = self.find(id).await?;
        if let Some(name) = request.name {
            account.name = name.trim().to_string();
        }
        if let Some(active) = request.active {
            account.active = active;
        }
        if let Some(role) = request.role {
            account.role = role;
        }

        self.accounts
            .update(&account)
            .await
            .map_err(|e| store_error(e, id, "update_account"))?;
        self.authenticator.evict(id).await;

        tracing::info!(account_id = %id, active = account.active, role = %account.role, "account updated");
        Ok(account)
    }

    #[tracing::instrument(name = "client.delete", skip(self))]
    pub async fn delete(&self, id: AccountId) -> Result<(), AuthError> {
        self.accounts
            .delete(id)
            .await
            .map_err(|e| store_error(e, id, "delete_account"))?;
        self.authenticator.evict(id).await;

        tracing::info!(account_id = %id, "account deleted");
        Ok(())
    }
}

fn store_error(err: StoreError, id: AccountId, operation: &'static str) -> AuthError {
    match err {
        StoreError::NotFound(_) => {
            AuthError::not_found("account not found").with_detail("account_id", id.to_string())
        }
        other => {
            tracing::error!(account_id = %id, error = %other, operation, "account store call failed");
            AuthError::dependency(format!("failed to {}", operation.replace('_', " ")), other)
                .with_detail("account_id", id.to_string())
                .with_detail("operation", operation)
        }
    }
}
