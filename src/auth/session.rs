// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-in, sign-up and token refresh.

use std::sync::Arc;
use std::time::Duration;

use super::error::{AuthError, ErrorKind};
use super::password::{salted_secret, HashError, PasswordHasher, MAX_SECRET_BYTES};
use super::token::TokenCodec;
use super::Role;
use crate::models::{AuthTokens, RefreshTokenRequest, SignInRequest, SignUpRequest};
use crate::storage::{Account, AccountId, AccountRepository, StoreError};

/// Token lifetimes and password policy.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub access_token_duration: Duration,
    pub refresh_token_duration: Duration,
    pub min_password_length: usize,
}

/// Issues token pairs and registers accounts.
pub struct SessionService {
    accounts: Arc<dyn AccountRepository>,
    hasher: Arc<dyn PasswordHasher>,
    access_codec: TokenCodec,
    refresh_codec: TokenCodec,
    options: SessionOptions,
}

impl SessionService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        hasher: Arc<dyn PasswordHasher>,
        access_codec: TokenCodec,
        refresh_codec: TokenCodec,
        options: SessionOptions,
    ) -> Self {
        Self {
            accounts,
            hasher,
            access_codec,
            refresh_codec,
            options,
        }
    }

    /// Exchange email and password for a fresh token pair.
    #[tracing::instrument(name = "auth.sign_in", skip_all)]
    pub async fn sign_in(&self, request: SignInRequest) -> Result<AuthTokens, AuthError> {
        request.validate().map_err(|e| {
            tracing::info!(error = %e, "invalid sign in params");
            e
        })?;

        let account = self.accounts.find_by_email(&request.email).await.map_err(|e| match e {
            StoreError::NotFound(_) => AuthError::not_found("account not found"),
            other => {
                tracing::error!(error = %other, "account lookup by email failed");
                AuthError::dependency("failed to find account", other)
                    .with_detail("operation", "find_account_by_email")
            }
        })?;

        let hasher = Arc::clone(&self.hasher);
        let digest = account.password_hash.clone();
        let secret = salted_secret(account.id, &request.password);
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&digest, &secret))
            .await
            .map_err(|e| AuthError::dependency("password verification task failed", e))?;

        match verified {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(account_id = %account.id, "password mismatch");
                return Err(invalid_password());
            }
            Err(e) => {
                tracing::warn!(account_id = %account.id, error = %e, "stored password digest unusable");
                return Err(invalid_password().with_source(e));
            }
        }

        tracing::info!(account_id = %account.id, "signed in");
        self.issue_tokens(account.id)
    }

    /// Register a new client account. Issues no tokens.
    #[tracing::instrument(name = "auth.sign_up", skip_all)]
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Account, AuthError> {
        request.validate()?;

        let password_length = request.password.chars().count();
        if password_length < self.options.min_password_length {
            return Err(AuthError::invalid_params(format!(
                "password must be at least {} characters",
                self.options.min_password_length
            ))
            .with_detail("password_length", password_length)
            .with_detail("min_password_length", self.options.min_password_length));
        }

        match self.accounts.find_by_email(&request.email).await {
            Ok(_) => return Err(email_taken()),
            Err(StoreError::NotFound(_)) => {}
            Err(other) => {
                tracing::error!(error = %other, "account lookup by email failed");
                return Err(AuthError::dependency("failed to check email availability", other)
                    .with_detail("operation", "find_account_by_email"));
            }
        }

        let id = AccountId::generate();
        let hasher = Arc::clone(&self.hasher);
        let secret = salted_secret(id, &request.password);
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| AuthError::dependency("password hashing task failed", e))?;
        let password_hash = match hashed {
            Ok(digest) => digest,
            Err(HashError::TooLong(_)) => {
                return Err(AuthError::invalid_params("password is too long")
                    .with_detail("password_bytes", request.password.len())
                    .with_detail("max_password_bytes", max_password_bytes(id)));
            }
            Err(e) => return Err(AuthError::dependency("failed to hash password", e)),
        };

        let account = Account::new(id, &request.name, &request.email, password_hash, Role::Client)?;

        self.accounts.create(&account).await.map_err(|e| match e {
            StoreError::AlreadyExists(_) => email_taken(),
            other => {
                tracing::error!(account_id = %id, error = %other, "account creation failed");
                AuthError::dependency("failed to create account", other)
                    .with_detail("account_id", id.to_string())
                    .with_detail("operation", "create_account")
            }
        })?;

        tracing::info!(account_id = %account.id, "account created");
        Ok(account)
    }

    /// Issue a new pair from a valid refresh token. The presented token is
    /// not revoked.
    #[tracing::instrument(name = "auth.refresh_token", skip_all)]
    pub async fn refresh(&self, request: RefreshTokenRequest) -> Result<AuthTokens, AuthError> {
        request.validate()?;

        let claims = self.refresh_codec.validate(&request.refresh_token).map_err(|e| {
            tracing::info!(error = %e, "refresh token rejected");
            e
        })?;

        self.issue_tokens(claims.account_id)
    }

    /// Access token first, then refresh token.
    fn issue_tokens(&self, subject: AccountId) -> Result<AuthTokens, AuthError> {
        let access_token = self
            .access_codec
            .generate(subject, self.options.access_token_duration)?;
        let refresh_token = self
            .refresh_codec
            .generate(subject, self.options.refresh_token_duration)?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
        })
    }
}

/// Password bytes left once the account id prefix is in the hash input.
fn max_password_bytes(id: AccountId) -> usize {
    MAX_SECRET_BYTES.saturating_sub(salted_secret(id, "").len())
}

fn invalid_password() -> AuthError {
    AuthError::new(ErrorKind::InvalidPassword, "invalid password")
}

fn email_taken() -> AuthError {
    AuthError::new(ErrorKind::EmailAlreadyExists, "email already registered")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authenticate::Authenticator;
    use crate::auth::password::BcryptHasher;
    use crate::cache::InMemoryCache;
    use crate::storage::InMemoryAccountRepository;
    use crate::testing::{self, FakeAccounts, RecordingHasher};

    fn codecs() -> (TokenCodec, TokenCodec) {
        (testing::access_codec(), testing::refresh_codec())
    }

    fn options() -> SessionOptions {
        let settings = testing::auth_settings();
        SessionOptions {
            access_token_duration: settings.access_token_duration,
            refresh_token_duration: settings.refresh_token_duration,
            min_password_length: settings.min_password_length,
        }
    }

    fn service(accounts: Arc<dyn AccountRepository>, hasher: Arc<dyn PasswordHasher>) -> SessionService {
        let (access, refresh) = codecs();
        SessionService::new(accounts, hasher, access, refresh, options())
    }

    fn sign_up_request(email: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.to_string(),
            name: "A".to_string(),
            password: password.to_string(),
        }
    }

    fn sign_in_request(email: &str, password: &str) -> SignInRequest {
        SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// Stored account whose digest matches `password` under RecordingHasher.
    fn stored_account(email: &str, password: &str) -> Account {
        let mut account = testing::account(Role::Client, true);
        account.email = email.to_string();
        account.password_hash = RecordingHasher::digest(&salted_secret(account.id, password));
        account
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_then_authenticate() {
        let accounts: Arc<dyn AccountRepository> = Arc::new(InMemoryAccountRepository::new());
        let service = service(accounts.clone(), Arc::new(BcryptHasher::new(4)));

        let account = service
            .sign_up(SignUpRequest {
                email: "a@b.com".to_string(),
                name: "A".to_string(),
                password: "longenough1".to_string(),
            })
            .await
            .unwrap();
        assert!(account.active);
        assert_eq!(account.role, Role::Client);
        assert!(!account.id.to_string().is_empty());

        let tokens = service
            .sign_in(sign_in_request("a@b.com", "longenough1"))
            .await
            .unwrap();
        assert!(!tokens.access_token.is_empty());
        assert!(!tokens.refresh_token.is_empty());

        let (access, _) = codecs();
        let authenticator = Authenticator::new(
            access,
            accounts,
            Arc::new(InMemoryCache::new(16)),
            Duration::from_secs(60),
        );
        let header = format!("Bearer {}", tokens.access_token);
        let authenticated = authenticator.authenticate(Some(&header)).await.unwrap();
        assert_eq!(authenticated.id, account.id);
    }

    #[tokio::test]
    async fn bcrypt_sign_in_rejects_wrong_passwords() {
        let accounts: Arc<dyn AccountRepository> = Arc::new(InMemoryAccountRepository::new());
        let service = service(accounts, Arc::new(BcryptHasher::new(4)));
        let password = "a".repeat(35);

        service
            .sign_up(sign_up_request("a@b.com", &password))
            .await
            .unwrap();
        assert!(service.sign_in(sign_in_request("a@b.com", &password)).await.is_ok());

        for wrong in [
            format!("{}b", "a".repeat(34)),
            format!("{}totally-different", "a".repeat(35)),
        ] {
            let err = service
                .sign_in(sign_in_request("a@b.com", &wrong))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidPassword, "{wrong}");
        }
    }

    #[tokio::test]
    async fn bcrypt_sign_up_rejects_password_past_input_limit() {
        let accounts = Arc::new(FakeAccounts::new());
        let service = service(accounts.clone(), Arc::new(BcryptHasher::new(4)));
        let password = format!("{}SECRET-TAIL-1", "a".repeat(35));

        let err = service
            .sign_up(sign_up_request("a@b.com", &password))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
        assert_eq!(err.details()["password_bytes"], 48);
        assert_eq!(err.details()["max_password_bytes"], 35);
        assert_eq!(accounts.create_calls(), 0);
    }

    #[tokio::test]
    async fn sign_in_verifies_salted_secret() {
        let account = stored_account("a@b.com", "longenough1");
        let hasher = Arc::new(RecordingHasher::new());
        let service = service(Arc::new(FakeAccounts::with([account.clone()])), hasher.clone());

        service
            .sign_in(sign_in_request("a@b.com", "longenough1"))
            .await
            .unwrap();
        assert_eq!(hasher.verify_inputs(), [format!("{}:longenough1", account.id)]);
    }

    #[tokio::test]
    async fn digest_from_other_account_does_not_verify() {
        let original = stored_account("a@b.com", "longenough1");
        let mut other = testing::account(Role::Client, true);
        other.email = "c@d.com".to_string();
        other.password_hash = original.password_hash.clone();

        let service = service(
            Arc::new(FakeAccounts::with([original, other])),
            Arc::new(RecordingHasher::new()),
        );

        let err = service
            .sign_in(sign_in_request("c@d.com", "longenough1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPassword);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_password() {
        let account = stored_account("a@b.com", "longenough1");
        let service = service(
            Arc::new(FakeAccounts::with([account])),
            Arc::new(RecordingHasher::new()),
        );

        let err = service
            .sign_in(sign_in_request("a@b.com", "wrong-password"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPassword);
    }

    #[tokio::test]
    async fn unusable_digest_is_invalid_password() {
        let mut account = stored_account("a@b.com", "longenough1");
        account.password_hash = "$corrupt".to_string();
        let service = service(
            Arc::new(FakeAccounts::with([account])),
            Arc::new(RecordingHasher::new()),
        );

        let err = service
            .sign_in(sign_in_request("a@b.com", "longenough1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPassword);
    }

    #[tokio::test]
    async fn sign_in_unknown_email_is_not_found() {
        let service = service(Arc::new(FakeAccounts::new()), Arc::new(RecordingHasher::new()));

        let err = service
            .sign_in(sign_in_request("ghost@b.com", "longenough1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    }

    #[tokio::test]
    async fn sign_in_store_failure_is_dependency_error() {
        let service = service(
            Arc::new(FakeAccounts::new().failing()),
            Arc::new(RecordingHasher::new()),
        );

        let err = service
            .sign_in(sign_in_request("a@b.com", "longenough1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyError);
    }

    #[tokio::test]
    async fn sign_in_rejects_malformed_input_before_lookup() {
        let accounts = Arc::new(FakeAccounts::new());
        let service = service(accounts.clone(), Arc::new(RecordingHasher::new()));

        let err = service.sign_in(sign_in_request("nope", "")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
        assert_eq!(err.message(), "email: invalid email; password: required");
        assert_eq!(accounts.find_by_email_calls(), 0);
    }

    #[tokio::test]
    async fn sign_up_duplicate_email_never_hashes_or_creates() {
        let existing = stored_account("a@b.com", "longenough1");
        let accounts = Arc::new(FakeAccounts::with([existing]));
        let hasher = Arc::new(RecordingHasher::new());
        let service = service(accounts.clone(), hasher.clone());

        let err = service
            .sign_up(sign_up_request("a@b.com", "longenough1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmailAlreadyExists);
        assert_eq!(hasher.hash_calls(), 0);
        assert_eq!(accounts.create_calls(), 0);
    }

    #[tokio::test]
    async fn sign_up_enforces_min_password_length() {
        let accounts = Arc::new(FakeAccounts::new());
        let service = service(accounts.clone(), Arc::new(RecordingHasher::new()));

        let err = service
            .sign_up(sign_up_request("a@b.com", "short"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
        assert_eq!(err.details()["password_length"], 5);
        assert_eq!(err.details()["min_password_length"], 8);
        assert_eq!(accounts.find_by_email_calls(), 0);
    }

    #[tokio::test]
    async fn sign_up_counts_characters_not_bytes() {
        let service = service(Arc::new(FakeAccounts::new()), Arc::new(RecordingHasher::new()));

        // 7 characters, 14 bytes
        let err = service
            .sign_up(sign_up_request("a@b.com", "ééééééé"))
            .await
            .unwrap_err();
        assert_eq!(err.details()["password_length"], 7);
    }

    #[tokio::test]
    async fn sign_up_hashes_salted_secret() {
        let accounts = Arc::new(FakeAccounts::new());
        let service = service(accounts.clone(), Arc::new(RecordingHasher::new()));

        let account = service
            .sign_up(sign_up_request("a@b.com", "longenough1"))
            .await
            .unwrap();
        assert_eq!(
            account.password_hash,
            RecordingHasher::digest(&format!("{}:longenough1", account.id))
        );
        assert_eq!(accounts.create_calls(), 1);
    }

    #[tokio::test]
    async fn sign_up_lookup_failure_is_dependency_error() {
        let service = service(
            Arc::new(FakeAccounts::new().failing()),
            Arc::new(RecordingHasher::new()),
        );

        let err = service
            .sign_up(sign_up_request("a@b.com", "longenough1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyError);
    }

    #[tokio::test]
    async fn refresh_issues_new_pair_for_same_subject() {
        let service = service(Arc::new(FakeAccounts::new()), Arc::new(RecordingHasher::new()));
        let (access, refresh) = codecs();
        let id = AccountId::generate();
        let refresh_token = refresh.generate(id, Duration::from_secs(60)).unwrap();

        let tokens = service
            .refresh(RefreshTokenRequest {
                refresh_token: refresh_token.clone(),
            })
            .await
            .unwrap();

        assert_eq!(access.validate(&tokens.access_token).unwrap().account_id, id);
        assert_eq!(refresh.validate(&tokens.refresh_token).unwrap().account_id, id);
        // Old token stays valid
        assert!(refresh.validate(&refresh_token).is_ok());
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() {
        let service = service(Arc::new(FakeAccounts::new()), Arc::new(RecordingHasher::new()));
        let (access, _) = codecs();
        let access_token = access
            .generate(AccountId::generate(), Duration::from_secs(60))
            .unwrap();

        let err = service
            .refresh(RefreshTokenRequest {
                refresh_token: access_token,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationInvalid);
    }

    #[tokio::test]
    async fn refresh_requires_token() {
        let service = service(Arc::new(FakeAccounts::new()), Arc::new(RecordingHasher::new()));

        let err = service
            .refresh(RefreshTokenRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
    }
}
