// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the validated session identity.

use serde::{Deserialize, Serialize};

use crate::storage::AccountId;

/// Registered claims carried by access and refresh tokens.
///
/// Both token classes share this layout; only the signing secret differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Subject (account ID in its UUID string form)
    pub sub: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Expiration timestamp
    pub exp: i64,
}

/// Identity recovered from a successfully validated token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClaims {
    pub account_id: AccountId,
}

impl SessionClaims {
    /// Parse the subject claim into an account identifier.
    pub fn from_subject(sub: &str) -> Option<Self> {
        sub.parse().ok().map(|account_id| Self { account_id })
    }
}
