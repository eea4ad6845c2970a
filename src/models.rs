// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize`/`Deserialize` and `ToSchema`
//! for JSON handling and OpenAPI documentation.
//!
//! Request bodies default every field so that a missing field surfaces as a
//! field-level `InvalidParams` error instead of a JSON rejection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::error::{AuthError, FieldErrors};
use crate::auth::permissions::Permission;
use crate::auth::Role;
use crate::storage::{Account, AccountId};

/// Loose structural email check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

// =============================================================================
// Auth Models
// =============================================================================

/// Credentials for `POST /v1/auth/sign-in`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SignInRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub password: String,
}

impl SignInRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        let mut errors = FieldErrors::new();
        if !is_valid_email(&self.email) {
            errors.add("email", "invalid email");
        }
        if self.password.is_empty() {
            errors.add("password", "required");
        }
        errors.into_result()
    }
}

/// Registration payload for `POST /v1/auth/sign-up`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SignUpRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    pub password: String,
}

impl SignUpRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        let mut errors = FieldErrors::new();
        if !is_valid_email(&self.email) {
            errors.add("email", "invalid email");
        }
        if self.name.trim().is_empty() {
            errors.add("name", "required");
        }
        if self.password.is_empty() {
            errors.add("password", "required");
        }
        errors.into_result()
    }
}

/// Body of `POST /v1/auth/token/refresh`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

impl RefreshTokenRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        let mut errors = FieldErrors::new();
        if self.refresh_token.is_empty() {
            errors.add("refreshToken", "required");
        }
        errors.into_result()
    }
}

/// Access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

// =============================================================================
// Account Models
// =============================================================================

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            active: account.active,
            role: account.role,
            created_at: account.created_at,
        }
    }
}

/// Default and upper bound for `pageSize` on account listings.
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Query parameters for `GET /v1/accounts`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListAccountsQuery {
    /// Zero-based page index (default: 0)
    #[param(default = 0)]
    pub page: Option<usize>,
    /// Accounts per page, 1 to 100 (default: 10)
    #[param(default = 10)]
    pub page_size: Option<usize>,
}

impl ListAccountsQuery {
    /// Resolved `(page, page_size)` after defaults and bounds checks.
    pub fn validate(&self) -> Result<(usize, usize), AuthError> {
        let page = self.page.unwrap_or(0);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        let mut errors = FieldErrors::new();
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            errors.add("pageSize", "must be between 1 and 100");
        }
        errors.into_result()?;
        Ok((page, page_size))
    }
}

/// One page of accounts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountPage {
    pub accounts: Vec<AccountResponse>,
    /// Accounts across all pages.
    pub total: usize,
    /// Number of pages at the requested page size.
    pub pages: usize,
}

/// Body of `PATCH /v1/accounts/{account_id}`. Absent fields are left as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    /// `false` locks the account out on its next request.
    pub active: Option<bool>,
    pub role: Option<Role>,
}

impl UpdateAccountRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        let mut errors = FieldErrors::new();
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            errors.add("name", "must not be empty");
        }
        errors.into_result()
    }
}

/// One granted `(resource, action)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PermissionEntry {
    #[schema(example = "me")]
    pub resource: String,
    #[schema(example = "manage")]
    pub action: String,
}

impl From<Permission> for PermissionEntry {
    fn from(permission: Permission) -> Self {
        Self {
            resource: permission.resource.to_string(),
            action: permission.action.to_string(),
        }
    }
}

/// Effective permissions of the calling account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsResponse {
    pub role: Role,
    /// `true` for the admin role, which is granted every action.
    pub unrestricted: bool,
    pub permissions: Vec<PermissionEntry>,
}
