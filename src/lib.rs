// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tenant Auth Server - token-based authentication and role authorization
//!
//! This crate issues and validates HS256 access/refresh tokens, resolves
//! bearer tokens to accounts through a read-through cache, and checks
//! `(resource, action)` requests against per-role permission sets.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token codec, authentication, authorization and sessions
//! - `cache` - TTL-bounded read-through cache
//! - `storage` - Account and permission repositories (in-memory, redb)

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub mod testing;
