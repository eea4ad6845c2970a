// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role permission table.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{StoreError, StoreResult};
use crate::auth::permissions::{Action, Permission, Resource};
use crate::auth::Role;

/// Resolves the ordered permission set granted to a role.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// [`StoreError::NotFound`] when the role has no table entry.
    async fn find_permissions(&self, role: Role) -> StoreResult<Vec<Permission>>;
}

/// Statically defined permission table.
#[derive(Debug, Clone)]
pub struct FixedPermissionTable {
    table: HashMap<Role, Vec<Permission>>,
}

impl FixedPermissionTable {
    /// The built-in table:
    ///
    /// | Role | Permissions |
    /// |------|-------------|
    /// | admin | `client:manage`, `favorite:manage` |
    /// | client | `me:manage` |
    pub fn new() -> Self {
        Self::from_map(HashMap::from([
            (
                Role::Admin,
                vec![
                    Permission::new(Resource::Client, Action::Manage),
                    Permission::new(Resource::Favorite, Action::Manage),
                ],
            ),
            (Role::Client, vec![Permission::new(Resource::Me, Action::Manage)]),
        ]))
    }

    /// Build a table from arbitrary entries. Roles absent from `table` are
    /// reported as not found.
    pub fn from_map(table: HashMap<Role, Vec<Permission>>) -> Self {
        Self { table }
    }
}

impl Default for FixedPermissionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PermissionRepository for FixedPermissionTable {
    async fn find_permissions(&self, role: Role) -> StoreResult<Vec<Permission>> {
        self.table
            .get(&role)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("role {role}")))
    }
}
