// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;

use tenant_auth_server::{
    api::router,
    auth::password::BcryptHasher,
    cache::InMemoryCache,
    config::Settings,
    state::AppState,
    storage::{AccountRepository, FixedPermissionTable, InMemoryAccountRepository, RedbAccountRepository},
    telemetry::init_tracing,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(settings.log_format);

    let accounts: Arc<dyn AccountRepository> = match settings.account_db_path() {
        Some(path) => {
            let repo = RedbAccountRepository::open(&path)
                .unwrap_or_else(|e| panic!("Failed to open account database {}: {e}", path.display()));
            tracing::info!(path = %path.display(), "Account database opened");
            Arc::new(repo)
        }
        None => {
            tracing::warn!("DATA_DIR not set, accounts are kept in memory only");
            Arc::new(InMemoryAccountRepository::new())
        }
    };

    let state = AppState::new(
        &settings.auth,
        accounts,
        Arc::new(FixedPermissionTable::new()),
        Arc::new(InMemoryCache::new(settings.cache_capacity)),
        Arc::new(BcryptHasher::new(settings.auth.password_hash_cost)),
    );
    let app = router(state);

    let addr = match settings.bind_addr().await {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(host = %settings.host, port = settings.port, error = %e, "failed to resolve bind address");
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    let handle = Handle::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));
    {
        let handle = handle.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown.cancelled().await;
            tracing::info!("Shutdown requested, draining connections");
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });
    }

    match settings.tls {
        Some(tls) => {
            // Install the ring crypto provider for rustls (must be done before any TLS operations)
            rustls::crypto::ring::default_provider()
                .install_default()
                .expect("Failed to install rustls crypto provider");

            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .expect("Failed to load TLS certificate and key");

            tracing::info!(%addr, "Tenant auth server listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTPS server failed");
        }
        None => {
            tracing::info!(%addr, "Tenant auth server listening on http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTP server failed");
        }
    }

    tracing::info!("Server stopped");
}

async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    shutdown.cancel();
}
