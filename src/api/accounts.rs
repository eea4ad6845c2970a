// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin account management. Reads need `client:read`, updates
//! `client:write` and removals `client:delete`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use crate::auth::{Action, Auth, AuthError, Resource};
use crate::error::ApiError;
use crate::models::{AccountPage, AccountResponse, ListAccountsQuery, UpdateAccountRequest};
use crate::state::AppState;
use crate::storage::{Account, AccountId};

fn parse_account_id(raw: &str) -> Result<AccountId, ApiError> {
    raw.parse::<AccountId>().map_err(|_| {
        ApiError::from(
            AuthError::invalid_params("account_id: invalid id")
                .with_detail("account_id", raw.to_string()),
        )
    })
}

async fn require(state: &AppState, caller: &Account, action: Action) -> Result<(), ApiError> {
    state
        .authorizer
        .authorize(caller, Resource::Client, action)
        .await?;
    Ok(())
}

/// List accounts, oldest first.
#[utoipa::path(
    get,
    path = "/v1/accounts",
    tag = "Accounts",
    security(("bearer" = [])),
    params(ListAccountsQuery),
    responses(
        (status = 200, description = "One page of accounts", body = AccountPage),
        (status = 403, description = "Not allowed"),
        (status = 422, description = "Invalid paging parameters"),
    )
)]
pub async fn list_accounts(
    State(state): State<AppState>,
    Auth(caller): Auth,
    query: Result<Query<ListAccountsQuery>, QueryRejection>,
) -> Result<Json<AccountPage>, ApiError> {
    require(&state, &caller, Action::Read).await?;
    let Query(query) = query?;
    Ok(Json(state.clients.list(query).await?))
}

/// Look up another account.
#[utoipa::path(
    get,
    path = "/v1/accounts/{account_id}",
    tag = "Accounts",
    security(("bearer" = [])),
    params(("account_id" = String, Path, description = "Account UUID")),
    responses(
        (status = 200, description = "Account information", body = AccountResponse),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Account not found"),
        (status = 422, description = "Malformed account id"),
    )
)]
pub async fn get_account(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path(account_id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    require(&state, &caller, Action::Read).await?;
    let id = parse_account_id(&account_id)?;
    Ok(Json(state.clients.find(id).await?.into()))
}

/// Change an account's name, role or active flag.
///
/// Deactivation locks the account out on its next request.
#[utoipa::path(
    patch,
    path = "/v1/accounts/{account_id}",
    tag = "Accounts",
    security(("bearer" = [])),
    params(("account_id" = String, Path, description = "Account UUID")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountResponse),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Account not found"),
        (status = 422, description = "Invalid request"),
    )
)]
pub async fn update_account(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path(account_id): Path<String>,
    body: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Result<Json<AccountResponse>, ApiError> {
    require(&state, &caller, Action::Write).await?;
    let id = parse_account_id(&account_id)?;
    let Json(request) = body?;

    let account = state.clients.update(id, request).await?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    delete,
    path = "/v1/accounts/{account_id}",
    tag = "Accounts",
    security(("bearer" = [])),
    params(("account_id" = String, Path, description = "Account UUID")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Account not found"),
    )
)]
pub async fn delete_account(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path(account_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require(&state, &caller, Action::Delete).await?;
    let id = parse_account_id(&account_id)?;

    state.clients.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
