// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{middleware::require_authentication, Role},
    models::{
        AccountPage, AccountResponse, AuthTokens, PermissionEntry, PermissionsResponse,
        RefreshTokenRequest, SignInRequest, SignUpRequest, UpdateAccountRequest,
    },
    state::AppState,
    storage::AccountId,
};

pub mod accounts;
pub mod auth;
pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/token/refresh", post(auth::refresh_token));

    let protected_routes = Router::new()
        .route("/me", get(users::get_me))
        .route("/me/permissions", get(users::get_my_permissions))
        .route("/accounts", get(accounts::list_accounts))
        .route(
            "/accounts/{account_id}",
            get(accounts::get_account)
                .patch(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_authentication,
        ));

    let v1_routes = public_routes.merge(protected_routes);

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http.request",
            method = %request.method(),
            uri = %request.uri(),
            request_id,
        )
    });

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::sign_in,
        auth::sign_up,
        auth::refresh_token,
        users::get_me,
        users::get_my_permissions,
        accounts::list_accounts,
        accounts::get_account,
        accounts::update_account,
        accounts::delete_account,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            AccountId,
            Role,
            SignInRequest,
            SignUpRequest,
            RefreshTokenRequest,
            AuthTokens,
            AccountResponse,
            AccountPage,
            UpdateAccountRequest,
            PermissionEntry,
            PermissionsResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Sign-in, sign-up and token refresh"),
        (name = "Accounts", description = "Own account access and admin account management"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
