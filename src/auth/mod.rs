// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Token issuance and validation, account authentication and role-based
//! authorization for the tenant API.
//!
//! ## Auth Flow
//!
//! 1. Client signs up (`POST /v1/auth/sign-up`), then signs in with email and
//!    password to obtain an access/refresh token pair
//! 2. Client sends `Authorization: Bearer <access token>`
//! 3. Server:
//!    - Verifies the HS256 signature, issuer, audience, expiry
//!    - Resolves `sub` to an account (read-through cache, then store)
//!    - Rejects inactive accounts
//!    - Checks the required `(resource, action)` against the role's
//!      permission set
//! 4. Client exchanges the refresh token for a new pair before the access
//!    token expires
//! 5. Admins list, update (including deactivation) and delete accounts;
//!    each write evicts the account's cached snapshot
//!
//! ## Security
//!
//! - Access and refresh tokens are signed with distinct secrets
//! - Passwords are hashed with bcrypt over `"<account id>:<password>"`
//! - Expiry is enforced with zero leeway
//! - Cached account snapshots live for at most `USER_CACHE_TTL_SECS`

pub mod authenticate;
pub mod authorize;
pub mod claims;
pub mod clients;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod session;
pub mod token;

pub use authenticate::Authenticator;
pub use authorize::{Authorizer, Grant};
pub use clients::ClientService;
pub use error::{AuthError, ErrorKind};
pub use extractor::Auth;
pub use permissions::{Action, Permission, Resource};
pub use roles::Role;
pub use session::{SessionOptions, SessionService};
pub use token::{TokenCodec, TokenCodecOptions};
