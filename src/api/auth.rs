// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session endpoints: sign-in, sign-up and token refresh.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::error::ApiError;
use crate::models::{
    AccountResponse, AuthTokens, RefreshTokenRequest, SignInRequest, SignUpRequest,
};
use crate::state::AppState;

/// Exchange email and password for a token pair.
#[utoipa::path(
    post,
    path = "/v1/auth/sign-in",
    tag = "Auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Token pair", body = AuthTokens),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "No account with this email"),
        (status = 422, description = "Invalid request body"),
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<AuthTokens>, ApiError> {
    let Json(request) = payload?;
    let tokens = state.sessions.sign_in(request).await?;
    Ok(Json(tokens))
}

/// Create a client account.
#[utoipa::path(
    post,
    path = "/v1/auth/sign-up",
    tag = "Auth",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid request body"),
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let Json(request) = payload?;
    let account = state.sessions.sign_up(request).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Exchange a refresh token for a new token pair.
#[utoipa::path(
    post,
    path = "/v1/auth/token/refresh",
    tag = "Auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token pair", body = AuthTokens),
        (status = 401, description = "Refresh token invalid or expired"),
        (status = 422, description = "Invalid request body"),
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<Json<AuthTokens>, ApiError> {
    let Json(request) = payload?;
    let tokens = state.sessions.refresh(request).await?;
    Ok(Json(tokens))
}
