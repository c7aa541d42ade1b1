//! Token Store
//!
//! Generic typed-token CRUD over the single tokens relation. Expiry is
//! enforced at the read boundary: an expired row is purged lazily and
//! reported as absent, so callers never see a stale token.

use std::sync::Arc;

use platform::clock::Clock;
use platform::crypto::{generate_secure_token, is_valid_token};

use crate::application::config::AuthConfig;
use crate::domain::entity::token::{
    LoginPayload, PasswordResetPayload, SessionPayload, Token, TokenKind, TokenPayload,
    VerifyEmailPayload,
};
use crate::domain::repository::TokenRepository;
use crate::error::AuthResult;

/// Typed-token CRUD over one storage shape
pub struct TokenStore<R>
where
    R: TokenRepository + Clone + Send + Sync + 'static,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<R> Clone for TokenStore<R>
where
    R: TokenRepository + Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<R> TokenStore<R>
where
    R: TokenRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            config,
            clock,
        }
    }

    /// Create and persist a token.
    ///
    /// The id is freshly generated; `id_length` overrides the configured
    /// default. The payload's variant must match `kind`.
    pub async fn create(
        &self,
        account_id: &str,
        expires: i64,
        kind: TokenKind,
        payload: Option<TokenPayload>,
        id_length: Option<usize>,
    ) -> AuthResult<Token> {
        debug_assert!(payload.as_ref().is_none_or(|p| p.kind() == kind));

        let now = self.clock.now_ms();
        debug_assert!(expires > now);

        let token = Token {
            id: generate_secure_token(id_length.unwrap_or(self.config.token_id_length)),
            created: now,
            expires,
            account_id: account_id.to_string(),
            kind,
            payload,
        };

        self.repo.insert_token(&token).await?;

        Ok(token)
    }

    /// Look up a live token.
    ///
    /// Malformed ids never reach storage. An expired row is deleted here
    /// rather than waiting for the sweep, and reported as absent.
    pub async fn get(&self, id: &str, kind: TokenKind) -> AuthResult<Option<Token>> {
        if !is_valid_token(id) {
            return Ok(None);
        }

        let Some(token) = self.repo.fetch_token(id, kind).await? else {
            return Ok(None);
        };

        if token.is_expired(self.clock.now_ms()) {
            self.repo.delete_token(id, kind).await?;
            return Ok(None);
        }

        Ok(Some(token))
    }

    pub async fn delete(&self, id: &str, kind: TokenKind) -> AuthResult<()> {
        self.repo.delete_token(id, kind).await
    }

    /// Replace the stored payload; returns whether the row still existed
    pub async fn update_payload(
        &self,
        id: &str,
        kind: TokenKind,
        payload: &TokenPayload,
    ) -> AuthResult<bool> {
        self.repo.update_token_payload(id, kind, payload).await
    }

    /// Remove every token past its expiry; returns the count
    pub async fn sweep_expired(&self) -> AuthResult<u64> {
        self.repo.delete_expired_tokens(self.clock.now_ms()).await
    }

    /// Live session tokens belonging to an account
    pub async fn sessions_for_account(&self, account_id: &str) -> AuthResult<Vec<Token>> {
        let now = self.clock.now_ms();
        let tokens = self.repo.session_tokens_for_account(account_id).await?;
        Ok(tokens.into_iter().filter(|t| !t.is_expired(now)).collect())
    }

    // ------------------------------------------------------------------
    // Typed constructors
    // ------------------------------------------------------------------

    pub async fn create_session_token(
        &self,
        account_id: &str,
        user_agent: Option<String>,
    ) -> AuthResult<Token> {
        let expires = self.clock.now_ms() + self.config.session_ttl_ms;
        let payload = TokenPayload::Session(SessionPayload {
            user_agent,
            ..Default::default()
        });
        self.create(account_id, expires, TokenKind::Session, Some(payload), None)
            .await
    }

    pub async fn create_verify_email_token(
        &self,
        account_id: &str,
        email: &str,
    ) -> AuthResult<Token> {
        let expires = self.clock.now_ms() + self.config.verify_email_ttl_ms;
        let payload = TokenPayload::VerifyEmail(VerifyEmailPayload {
            email: email.to_string(),
        });
        self.create(
            account_id,
            expires,
            TokenKind::VerifyEmail,
            Some(payload),
            None,
        )
        .await
    }

    pub async fn create_password_reset_token(
        &self,
        account_id: &str,
        email: &str,
        user_agent: Option<String>,
    ) -> AuthResult<Token> {
        let expires = self.clock.now_ms() + self.config.password_reset_ttl_ms;
        let payload = TokenPayload::PasswordReset(PasswordResetPayload {
            verify_email: email.to_string(),
            user_agent,
        });
        self.create(
            account_id,
            expires,
            TokenKind::PasswordReset,
            Some(payload),
            None,
        )
        .await
    }

    pub async fn create_login_token(
        &self,
        account_id: &str,
        email: &str,
        user_agent: Option<String>,
    ) -> AuthResult<Token> {
        let expires = self.clock.now_ms() + self.config.login_token_ttl_ms;
        let payload = TokenPayload::Login(LoginPayload {
            verify_email: email.to_string(),
            user_agent,
        });
        self.create(account_id, expires, TokenKind::Login, Some(payload), None)
            .await
    }
}
