// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::auth::{AuthError, ErrorKind};

/// HTTP face of an [`AuthError`].
#[derive(Debug)]
pub struct ApiError(AuthError);

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Map<String, Value>>,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind()
    }

    pub fn status(&self) -> StatusCode {
        status_for(self.0.kind())
    }
}

/// Status code for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidParams => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::ResourceNotFound => StatusCode::NOT_FOUND,
        ErrorKind::DependencyError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::OperationNotAllowed | ErrorKind::UserNotActive => StatusCode::FORBIDDEN,
        ErrorKind::AuthenticationNotFound
        | ErrorKind::AuthenticationInvalid
        | ErrorKind::InvalidPassword => StatusCode::UNAUTHORIZED,
        ErrorKind::EmailAlreadyExists => StatusCode::CONFLICT,
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AuthError::invalid_params(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(AuthError::invalid_params(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let err = &self.0;
        let details = err.details();

        let details_json = Value::Object(details.clone());
        if status.is_server_error() {
            tracing::error!(code = err.kind().code(), details = %details_json, "{err}");
        } else if !details.is_empty() {
            tracing::warn!(code = err.kind().code(), details = %details_json, "{err}");
        } else {
            tracing::info!(code = err.kind().code(), "{err}");
        }

        // Only field-level validation context is meant for callers.
        let body = ErrorBody {
            code: err.kind().code(),
            message: err.message(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            details: (err.kind() == ErrorKind::InvalidParams && !details.is_empty())
                .then_some(details),
        };
        (status, Json(body)).into_response()
    }
}
