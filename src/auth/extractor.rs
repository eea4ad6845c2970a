// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated accounts.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(account): Auth) -> impl IntoResponse {
//!     // account is an active Account
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::Account;

/// Extractor for authenticated accounts.
///
/// Uses the account stored by [`super::middleware::require_authentication`]
/// when present; otherwise authenticates the `Authorization` header itself.
pub struct Auth(pub Account);

impl FromRequestParts<AppState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the account
        if let Some(account) = parts.extensions.get::<Account>().cloned() {
            return Ok(Auth(account));
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let account = state.authenticator.authenticate(header).await?;
        parts.extensions.insert(account.clone());

        Ok(Auth(account))
    }
}
