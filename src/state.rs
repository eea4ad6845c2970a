// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::password::PasswordHasher;
use crate::auth::{
    Authenticator, Authorizer, ClientService, SessionOptions, SessionService, TokenCodec,
    TokenCodecOptions,
};
use crate::cache::Cache;
use crate::config::AuthSettings;
use crate::storage::{AccountRepository, PermissionRepository};

/// Shared handles for request handlers. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub authorizer: Arc<Authorizer>,
    pub sessions: Arc<SessionService>,
    pub clients: Arc<ClientService>,
    pub accounts: Arc<dyn AccountRepository>,
    pub cache: Arc<dyn Cache>,
}

impl AppState {
    /// Wire the auth services over the given collaborators.
    pub fn new(
        settings: &AuthSettings,
        accounts: Arc<dyn AccountRepository>,
        permissions: Arc<dyn PermissionRepository>,
        cache: Arc<dyn Cache>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let access_codec = TokenCodec::new(TokenCodecOptions {
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            secret: settings.access_token_secret.clone(),
        });
        let refresh_codec = TokenCodec::new(TokenCodecOptions {
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            secret: settings.refresh_token_secret.clone(),
        });

        let authenticator = Arc::new(Authenticator::new(
            access_codec.clone(),
            Arc::clone(&accounts),
            Arc::clone(&cache),
            settings.user_cache_ttl,
        ));
        let clients = ClientService::new(Arc::clone(&accounts), Arc::clone(&authenticator));
        let authorizer = Authorizer::new(
            permissions,
            Arc::clone(&cache),
            settings.role_permissions_cache_ttl,
        );
        let sessions = SessionService::new(
            Arc::clone(&accounts),
            hasher,
            access_codec,
            refresh_codec,
            SessionOptions {
                access_token_duration: settings.access_token_duration,
                refresh_token_duration: settings.refresh_token_duration,
                min_password_length: settings.min_password_length,
            },
        );

        Self {
            authenticator,
            authorizer: Arc::new(authorizer),
            sessions: Arc::new(sessions),
            clients: Arc::new(clients),
            accounts,
            cache,
        }
    }
}
