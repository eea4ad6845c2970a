// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup; the resulting [`Settings`] are read-only afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `ACCESS_TOKEN_SECRET` | HMAC secret for access tokens | Required |
//! | `REFRESH_TOKEN_SECRET` | HMAC secret for refresh tokens (must differ) | Required |
//! | `JWT_ISSUER` | `iss` claim issued and expected | `tenant-auth-server` |
//! | `JWT_AUDIENCE` | `aud` claim issued and expected | value of `JWT_ISSUER` |
//! | `ACCESS_TOKEN_DURATION_SECS` | Access token lifetime | `900` |
//! | `REFRESH_TOKEN_DURATION_SECS` | Refresh token lifetime | `2592000` |
//! | `USER_CACHE_TTL_SECS` | Account snapshot TTL (`0` disables) | `300` |
//! | `ROLE_PERMISSIONS_CACHE_TTL_SECS` | Permission set TTL (`0` disables) | `3600` |
//! | `CACHE_CAPACITY` | Max in-process cache entries | `10000` |
//! | `MIN_PASSWORD_LENGTH` | Sign-up password policy (characters) | `8` |
//! | `PASSWORD_HASH_COST` | bcrypt cost factor (4-31) | `10` |
//! | `DATA_DIR` | Directory for `accounts.redb`; unset keeps accounts in memory | unset |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key; both or neither | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::telemetry::LogFormat;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const ACCESS_TOKEN_SECRET_ENV: &str = "ACCESS_TOKEN_SECRET";
pub const REFRESH_TOKEN_SECRET_ENV: &str = "REFRESH_TOKEN_SECRET";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const ACCESS_TOKEN_DURATION_ENV: &str = "ACCESS_TOKEN_DURATION_SECS";
pub const REFRESH_TOKEN_DURATION_ENV: &str = "REFRESH_TOKEN_DURATION_SECS";
pub const USER_CACHE_TTL_ENV: &str = "USER_CACHE_TTL_SECS";
pub const ROLE_PERMISSIONS_CACHE_TTL_ENV: &str = "ROLE_PERMISSIONS_CACHE_TTL_SECS";
pub const CACHE_CAPACITY_ENV: &str = "CACHE_CAPACITY";
pub const MIN_PASSWORD_LENGTH_ENV: &str = "MIN_PASSWORD_LENGTH";
pub const PASSWORD_HASH_COST_ENV: &str = "PASSWORD_HASH_COST";

/// Environment variable name for the account database directory.
///
/// When set, accounts persist in `<DATA_DIR>/accounts.redb`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_ISSUER: &str = "tenant-auth-server";
pub const DEFAULT_ACCESS_TOKEN_DURATION_SECS: u64 = 15 * 60;
pub const DEFAULT_REFRESH_TOKEN_DURATION_SECS: u64 = 720 * 60 * 60;
pub const DEFAULT_USER_CACHE_TTL_SECS: u64 = 5 * 60;
pub const DEFAULT_ROLE_PERMISSIONS_CACHE_TTL_SECS: u64 = 60 * 60;
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;
pub const DEFAULT_PASSWORD_HASH_COST: u32 = 10;

/// File name of the account database inside `DATA_DIR`.
pub const ACCOUNT_DB_FILE: &str = "accounts.redb";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ")]
    SharedSecret,

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,
}

/// Token, cache and password policy.
#[derive(Clone)]
pub struct AuthSettings {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_duration: Duration,
    pub refresh_token_duration: Duration,
    pub user_cache_ttl: Duration,
    pub role_permissions_cache_ttl: Duration,
    pub min_password_length: usize,
    pub password_hash_cost: u32,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("access_token_secret", &"<redacted>")
            .field("refresh_token_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_duration", &self.access_token_duration)
            .field("refresh_token_duration", &self.refresh_token_duration)
            .field("user_cache_ttl", &self.user_cache_ttl)
            .field("role_permissions_cache_ttl", &self.role_permissions_cache_ttl)
            .field("min_password_length", &self.min_password_length)
            .field("password_hash_cost", &self.password_hash_cost)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub auth: AuthSettings,
    pub cache_capacity: usize,
    pub data_dir: Option<PathBuf>,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let access_token_secret =
            get(ACCESS_TOKEN_SECRET_ENV).ok_or(ConfigError::Missing(ACCESS_TOKEN_SECRET_ENV))?;
        let refresh_token_secret =
            get(REFRESH_TOKEN_SECRET_ENV).ok_or(ConfigError::Missing(REFRESH_TOKEN_SECRET_ENV))?;
        if access_token_secret == refresh_token_secret {
            return Err(ConfigError::SharedSecret);
        }

        let issuer = get(JWT_ISSUER_ENV).unwrap_or_else(|| DEFAULT_ISSUER.to_string());
        let audience = get(JWT_AUDIENCE_ENV).unwrap_or_else(|| issuer.clone());

        let min_password_length =
            parse_or(get(MIN_PASSWORD_LENGTH_ENV), MIN_PASSWORD_LENGTH_ENV, DEFAULT_MIN_PASSWORD_LENGTH)?;
        if min_password_length == 0 {
            return Err(invalid(MIN_PASSWORD_LENGTH_ENV, "0", "must be at least 1"));
        }

        let password_hash_cost =
            parse_or(get(PASSWORD_HASH_COST_ENV), PASSWORD_HASH_COST_ENV, DEFAULT_PASSWORD_HASH_COST)?;
        if !(4..=31).contains(&password_hash_cost) {
            return Err(invalid(
                PASSWORD_HASH_COST_ENV,
                &password_hash_cost.to_string(),
                "must be between 4 and 31",
            ));
        }

        let auth = AuthSettings {
            access_token_secret,
            refresh_token_secret,
            issuer,
            audience,
            access_token_duration: secs_or(
                get(ACCESS_TOKEN_DURATION_ENV),
                ACCESS_TOKEN_DURATION_ENV,
                DEFAULT_ACCESS_TOKEN_DURATION_SECS,
            )?,
            refresh_token_duration: secs_or(
                get(REFRESH_TOKEN_DURATION_ENV),
                REFRESH_TOKEN_DURATION_ENV,
                DEFAULT_REFRESH_TOKEN_DURATION_SECS,
            )?,
            user_cache_ttl: Duration::from_secs(parse_or(
                get(USER_CACHE_TTL_ENV),
                USER_CACHE_TTL_ENV,
                DEFAULT_USER_CACHE_TTL_SECS,
            )?),
            role_permissions_cache_ttl: Duration::from_secs(parse_or(
                get(ROLE_PERMISSIONS_CACHE_TTL_ENV),
                ROLE_PERMISSIONS_CACHE_TTL_ENV,
                DEFAULT_ROLE_PERMISSIONS_CACHE_TTL_SECS,
            )?),
            min_password_length,
            password_hash_cost,
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get(PORT_ENV), PORT_ENV, 8080)?,
            auth,
            cache_capacity: parse_or(get(CACHE_CAPACITY_ENV), CACHE_CAPACITY_ENV, DEFAULT_CACHE_CAPACITY)?,
            data_dir: get(DATA_DIR_ENV).map(PathBuf::from),
            tls,
            log_format: get(LOG_FORMAT_ENV)
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
        })
    }

    /// Resolve `HOST`/`PORT` to the address to bind. Accepts IPv4 and IPv6
    /// literals as well as host names.
    pub async fn bind_addr(&self) -> std::io::Result<SocketAddr> {
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    format!("{} resolved to no address", self.host),
                )
            })
    }

    /// Path of the account database, when persistence is enabled.
    pub fn account_db_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(ACCOUNT_DB_FILE))
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T>(value: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(var, &raw, &e.to_string())),
        None => Ok(default),
    }
}

/// Token lifetimes must be positive.
fn secs_or(value: Option<String>, var: &'static str, default: u64) -> Result<Duration, ConfigError> {
    let secs = parse_or(value, var, default)?;
    if secs == 0 {
        return Err(invalid(var, "0", "must be positive"));
    }
    Ok(Duration::from_secs(secs))
}
