// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.
//!
//! Every operation in [`crate::auth`] fails with an [`AuthError`] carrying a
//! closed [`ErrorKind`]. The kind is the only contract surfaced to transports;
//! HTTP status mapping lives in [`crate::error`].

use serde_json::{Map, Value};

/// Boxed collaborator failure attached to an [`AuthError`] as its cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Closed set of error kinds emitted by the auth core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing input
    InvalidParams,
    /// Account or role does not exist
    ResourceNotFound,
    /// An external collaborator failed unexpectedly
    DependencyError,
    /// Authorization denied
    OperationNotAllowed,
    /// No credential presented
    AuthenticationNotFound,
    /// Credential present but unverifiable
    AuthenticationInvalid,
    /// Identity verified, wrong secret
    InvalidPassword,
    /// Identity verified, account disabled
    UserNotActive,
    /// Sign-up conflict
    EmailAlreadyExists,
}

impl ErrorKind {
    /// Stable error code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidParams => "AQF002",
            ErrorKind::ResourceNotFound => "AQF003",
            ErrorKind::DependencyError => "AQF004",
            ErrorKind::OperationNotAllowed => "AQF005",
            ErrorKind::EmailAlreadyExists => "USR001",
            ErrorKind::UserNotActive => "USR002",
            ErrorKind::InvalidPassword => "AUT001",
            ErrorKind::AuthenticationNotFound => "AUT002",
            ErrorKind::AuthenticationInvalid => "AUT003",
        }
    }
}

/// Error returned by the authentication and authorization operations.
///
/// The message is safe to show to callers. Structured `details` and the
/// optional `source` are diagnostic context for logs.
#[derive(Debug)]
pub struct AuthError {
    kind: ErrorKind,
    message: String,
    details: Map<String, Value>,
    source: Option<BoxError>,
}

impl AuthError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Map::new(),
            source: None,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResourceNotFound, message)
    }

    /// Wrap a collaborator failure.
    pub fn dependency(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::new(ErrorKind::DependencyError, message).with_source(cause)
    }

    /// Attach a structured detail.
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, cause: impl Into<BoxError>) -> Self {
        self.source = Some(cause.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &Map<String, Value> {
        &self.details
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind.code(), self.message)?;
        if let Some(source) = &self.source {
            write!(f, " | cause: {source}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Collects field-level validation failures into a single `InvalidParams` error.
#[derive(Debug, Default)]
pub struct FieldErrors {
    fields: Vec<(String, String)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.fields.push((field.to_string(), message.to_string()));
    }

    /// `Ok(())` when nothing was recorded, otherwise an `InvalidParams` error
    /// whose message lists every field in insertion order.
    pub fn into_result(self) -> Result<(), AuthError> {
        if self.fields.is_empty() {
            return Ok(());
        }

        let message = self
            .fields
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");

        let fields: Vec<Value> = self
            .fields
            .into_iter()
            .map(|(field, message)| serde_json::json!({ "field": field, "message": message }))
            .collect();

        Err(AuthError::invalid_params(message).with_detail("fields", fields))
    }
}
