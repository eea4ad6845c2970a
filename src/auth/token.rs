// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed, time-bounded identity tokens.
//!
//! A [`TokenCodec`] owns one HMAC secret and one issuer/audience pair. The
//! service builds two of them, one for access tokens and one for refresh
//! tokens, so a token minted by one codec never validates in the other.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::{JwtClaims, SessionClaims};
use super::error::{AuthError, ErrorKind};
use crate::storage::AccountId;

/// Construction parameters for a [`TokenCodec`].
#[derive(Clone)]
pub struct TokenCodecOptions {
    pub issuer: String,
    pub audience: String,
    pub secret: String,
}

/// Issues and validates HMAC-signed JWTs for one token class.
#[derive(Clone)]
pub struct TokenCodec {
    issuer: String,
    audience: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(options: TokenCodecOptions) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[&options.issuer]);
        validation.set_audience(&[&options.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(options.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(options.secret.as_bytes()),
            issuer: options.issuer,
            audience: options.audience,
            validation,
        }
    }

    /// Sign a token for `subject` valid from now for `duration`.
    pub fn generate(&self, subject: AccountId, duration: Duration) -> Result<String, AuthError> {
        self.generate_at(subject, Utc::now().timestamp(), duration)
    }

    pub(crate) fn generate_at(
        &self,
        subject: AccountId,
        issued_at: i64,
        duration: Duration,
    ) -> Result<String, AuthError> {
        let lifetime = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        let claims = JwtClaims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: subject.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: issued_at.saturating_add(lifetime),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::dependency("failed to sign token", e))
    }

    /// Verify signature, algorithm family, issuer, audience and lifetime, then
    /// recover the subject.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                let reason = match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => "expired",
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => "invalid_signature",
                    jsonwebtoken::errors::ErrorKind::InvalidIssuer => "invalid_issuer",
                    jsonwebtoken::errors::ErrorKind::InvalidAudience => "invalid_audience",
                    jsonwebtoken::errors::ErrorKind::ImmatureSignature => "not_yet_valid",
                    jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => "invalid_algorithm",
                    jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_) => "missing_claim",
                    _ => "malformed",
                };
                invalid_token(reason).with_source(e)
            })?;

        SessionClaims::from_subject(&data.claims.sub).ok_or_else(|| invalid_token("invalid_subject"))
    }
}

fn invalid_token(reason: &'static str) -> AuthError {
    AuthError::new(ErrorKind::AuthenticationInvalid, "invalid token").with_detail("reason", reason)
}
