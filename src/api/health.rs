// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;

use crate::state::AppState;

const PROBE_KEY: &str = "health:probe";

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Cache round trip ("ok" or "unavailable").
    pub cache: String,
    /// Account store read ("ok" or "unavailable").
    pub accounts: String,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

async fn check_cache(state: &AppState) -> bool {
    let written = state
        .cache
        .set(PROBE_KEY, b"ok".to_vec(), Duration::from_secs(5))
        .await;
    if let Err(e) = written {
        tracing::warn!(error = %e, "cache probe write failed");
        return false;
    }

    match state.cache.get(PROBE_KEY).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "cache probe read failed");
            false
        }
    }
}

async fn check_accounts(state: &AppState) -> bool {
    match state.accounts.list(0, 1).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "account store probe failed");
            false
        }
    }
}

fn label(ok: bool) -> String {
    let label = if ok { "ok" } else { "unavailable" };
    label.to_string()
}

/// Health check endpoint handler.
///
/// Returns 200 if all checks pass, 503 if any check fails.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let cache_ok = check_cache(&state).await;
    let accounts_ok = check_accounts(&state).await;
    let healthy = cache_ok && accounts_ok;

    let response = ReadyResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            cache: label(cache_ok),
            accounts: label(accounts_ok),
        },
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}
