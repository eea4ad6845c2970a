// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role-based access decisions.
//!
//! ## Matching rules
//!
//! 1. The role's permission set must resolve. An unknown role is
//!    `ResourceNotFound`, even for the admin role.
//! 2. The admin role is granted everything.
//! 3. Otherwise the set is scanned in stored order and the first permission
//!    on the requested resource whose action is `manage`, equals the
//!    requested action, or is `write` for a `read` request, grants access.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::error::{AuthError, ErrorKind};
use super::permissions::{Action, Permission, Resource};
use super::Role;
use crate::cache::{read_json, role_permissions_key, spawn_populate, Cache};
use crate::storage::{Account, PermissionRepository, StoreError};

/// The rule that admitted a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    AdminRole,
    Manage(Permission),
    Exact(Permission),
    WriteImpliesRead(Permission),
}

impl std::fmt::Display for Grant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grant::AdminRole => f.write_str("admin role"),
            Grant::Manage(p) => write!(f, "{p} (manage)"),
            Grant::Exact(p) => write!(f, "{p} (exact)"),
            Grant::WriteImpliesRead(p) => write!(f, "{p} (write implies read)"),
        }
    }
}

/// First-match scan of a non-admin permission set.
pub fn evaluate(permissions: &[Permission], resource: Resource, action: Action) -> Option<Grant> {
    permissions
        .iter()
        .find(|p| p.resource == resource && p.action.satisfies(action))
        .map(|&p| match p.action {
            Action::Manage => Grant::Manage(p),
            stored if stored == action => Grant::Exact(p),
            _ => Grant::WriteImpliesRead(p),
        })
}

pub struct Authorizer {
    permissions: Arc<dyn PermissionRepository>,
    cache: Arc<dyn Cache>,
    cache_ttl: Duration,
}

impl Authorizer {
    pub fn new(
        permissions: Arc<dyn PermissionRepository>,
        cache: Arc<dyn Cache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            permissions,
            cache,
            cache_ttl,
        }
    }

    /// Decide whether `account` may perform `action` on `resource`.
    #[tracing::instrument(
        name = "auth.authorize",
        skip_all,
        fields(account_id = %account.id, role = %account.role, resource = %resource, action = %action)
    )]
    pub async fn authorize(
        &self,
        account: &Account,
        resource: Resource,
        action: Action,
    ) -> Result<Grant, AuthError> {
        let permissions = self.effective_permissions(account.role).await?;

        if account.role.is_admin() {
            tracing::info!("access granted by admin role");
            return Ok(Grant::AdminRole);
        }

        if let Some(grant) = evaluate(&permissions, resource, action) {
            tracing::info!(grant = %grant, "access granted");
            return Ok(grant);
        }

        let listed: Vec<Value> = permissions.iter().map(|p| Value::from(p.to_string())).collect();
        tracing::warn!(permissions = ?listed, "permission denied");

        Err(AuthError::new(ErrorKind::OperationNotAllowed, "permission denied")
            .with_detail("account_id", account.id.to_string())
            .with_detail("role", account.role.to_string())
            .with_detail("resource", resource.to_string())
            .with_detail("action", action.to_string())
            .with_detail("permissions", listed))
    }

    /// The ordered permission set of `role`, read through the cache.
    pub async fn effective_permissions(&self, role: Role) -> Result<Vec<Permission>, AuthError> {
        let key = role_permissions_key(role);

        if let Some(permissions) = read_json::<Vec<Permission>>(self.cache.as_ref(), &key).await {
            return Ok(permissions);
        }

        let permissions = self.permissions.find_permissions(role).await.map_err(|e| match e {
            StoreError::NotFound(_) => {
                tracing::warn!(role = %role, "role not found");
                AuthError::not_found("role not found").with_detail("role", role.to_string())
            }
            other => {
                tracing::error!(role = %role, error = %other, "permission lookup failed");
                AuthError::dependency("failed to load role permissions", other)
                    .with_detail("role", role.to_string())
                    .with_detail("operation", "find_permissions")
            }
        })?;

        let _ = spawn_populate(Arc::clone(&self.cache), key, permissions.clone(), self.cache_ttl);

        Ok(permissions)
    }
}
