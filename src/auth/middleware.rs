// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Applied to a whole router subtree with
//! `axum::middleware::from_fn_with_state(state, require_authentication)`.
//! The authenticated [`Account`] is placed in the request extensions, where
//! the [`super::Auth`] extractor picks it up.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::Account;

/// Reject the request unless it carries a valid access token for an active
/// account.
pub async fn require_authentication(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.authenticator.authenticate(header).await {
        Ok(account) => {
            request.extensions_mut().insert::<Account>(account);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
