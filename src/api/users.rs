// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Endpoints about the calling account. All routes here sit behind
//! [`crate::auth::middleware::require_authentication`].

use axum::{extract::State, Json};

use crate::auth::{Action, Auth, Resource};
use crate::error::ApiError;
use crate::models::{AccountResponse, PermissionEntry, PermissionsResponse};
use crate::state::AppState;

/// Get the calling account.
#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Accounts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Account information", body = AccountResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Account disabled or not allowed"),
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    Auth(account): Auth,
) -> Result<Json<AccountResponse>, ApiError> {
    state
        .authorizer
        .authorize(&account, Resource::Me, Action::Read)
        .await?;
    Ok(Json(account.into()))
}

/// List what the calling account's role may do.
#[utoipa::path(
    get,
    path = "/v1/me/permissions",
    tag = "Accounts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Effective permissions", body = PermissionsResponse),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_my_permissions(
    State(state): State<AppState>,
    Auth(account): Auth,
) -> Result<Json<PermissionsResponse>, ApiError> {
    let permissions = state.authorizer.effective_permissions(account.role).await?;
    Ok(Json(PermissionsResponse {
        role: account.role,
        unrestricted: account.role.is_admin(),
        permissions: permissions.into_iter().map(PermissionEntry::from).collect(),
    }))
}
