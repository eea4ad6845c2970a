// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account roles.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role tag carried by every account.
///
/// ## Roles
///
/// - `Admin` - Bypasses permission matching once its permission set resolves
/// - `Client` - Default role for self-registered accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrative access
    Admin,
    /// Regular self-registered account
    Client,
}

impl Role {
    /// Whether this is the distinguished admin role.
    pub fn is_admin(&self) -> bool {
        *self == Role::Admin
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
        }
    }
}

impl Default for Role {
    /// Least privilege for new accounts.
    fn default() -> Self {
        Role::Client
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
