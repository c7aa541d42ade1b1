//! Account Service
//!
//! Orchestrates signup, login, credential rotation, email change, and
//! token-redemption flows over the directory, token store, audit trail,
//! breach corpus, and mailer. Every operation returns a discriminated
//! result so presentation code can map errors to user-facing text
//! without this crate knowing anything about rendering.

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;

use audit::{AuditEventKind, AuditLevel, AuditTrail};
use platform::clock::Clock;
use platform::password::{BreachListLookup, satisfies_policy};

use crate::application::account_directory::AccountDirectory;
use crate::application::config::AuthConfig;
use crate::application::token_store::TokenStore;
use crate::domain::entity::account::{Account, is_valid_email};
use crate::domain::entity::token::TokenKind;
use crate::domain::entity::tombstone::Tombstone;
use crate::domain::repository::{AccountRepository, TokenRepository};
use crate::error::{AuthError, AuthResult};
use crate::infra::mailer::{Mailer, templates};

// ============================================================================
// Flow Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum SignupError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("email address is already in use")]
    EmailExists,
    #[error("password does not satisfy the policy")]
    InvalidPassword,
    #[error("password appears in a breach corpus")]
    TrivialPassword,
    #[error("failed to create account: {0}")]
    ErrorCreatingAccount(String),
}

impl From<AuthError> for SignupError {
    fn from(err: AuthError) -> Self {
        SignupError::ErrorCreatingAccount(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid email address")]
    InvalidEmail,
    /// Distinguishable from a wrong password by an explicit UX trade-off
    #[error("no account with this email address")]
    AccountNotFound,
    #[error("wrong password")]
    InvalidPassword,
    #[error(transparent)]
    Unavailable(#[from] AuthError),
}

#[derive(Debug, Error)]
pub enum SetPasswordError {
    #[error("password does not satisfy the policy")]
    InvalidPassword,
    #[error("password appears in a breach corpus")]
    TrivialPassword,
    #[error(transparent)]
    Unavailable(#[from] AuthError),
}

#[derive(Debug, Error)]
pub enum ChangeEmailError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("email address is already in use")]
    EmailInUse,
    #[error("account not found")]
    AccountNotFound,
    #[error("failed to update account")]
    UpdateFailed,
}

impl From<AuthError> for ChangeEmailError {
    fn from(err: AuthError) -> Self {
        tracing::error!(error = %err, "email update failed");
        ChangeEmailError::UpdateFailed
    }
}

/// Errors for the email-link request flows (password reset, login link)
#[derive(Debug, Error)]
pub enum LinkRequestError {
    #[error("invalid email address")]
    InvalidEmail,
    /// Distinguishable on purpose, same trade-off as login
    #[error("no account with this email address")]
    AccountNotFound,
    #[error(transparent)]
    Unavailable(#[from] AuthError),
}

#[derive(Debug, Error)]
pub enum RedeemResetError {
    /// Expired and unknown tokens are one combined case
    #[error("password reset token not found or expired")]
    InvalidToken,
    #[error("account not found")]
    AccountNotFound,
    #[error("password does not satisfy the policy")]
    InvalidPassword,
    #[error("password appears in a breach corpus")]
    TrivialPassword,
    #[error(transparent)]
    Unavailable(#[from] AuthError),
}

#[derive(Debug, Error)]
pub enum LoginTokenError {
    #[error("login link not found or expired")]
    InvalidToken,
    #[error("account not found")]
    AccountNotFound,
    #[error(transparent)]
    Unavailable(#[from] AuthError),
}

#[derive(Debug, Error)]
pub enum VerifyEmailError {
    #[error("email verification token not found or expired")]
    InvalidToken,
    #[error("account not found")]
    AccountNotFound,
    #[error(transparent)]
    Unavailable(#[from] AuthError),
}

// ============================================================================
// Service
// ============================================================================

pub struct AccountService<R, M>
where
    R: AccountRepository + TokenRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    directory: AccountDirectory<R>,
    tokens: TokenStore<R>,
    repo: Arc<R>,
    audit: AuditTrail,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<R, M> AccountService<R, M>
where
    R: AccountRepository + TokenRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    pub fn new(
        repo: Arc<R>,
        audit: AuditTrail,
        mailer: Arc<M>,
        config: Arc<AuthConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory: AccountDirectory::new(repo.clone(), config.clone(), clock.clone()),
            tokens: TokenStore::new(repo.clone(), config.clone(), clock.clone()),
            repo,
            audit,
            mailer,
            config,
            clock,
        }
    }

    pub fn directory(&self) -> &AccountDirectory<R> {
        &self.directory
    }

    /// Create an account, audit the outcome, and send the verification
    /// email. A supplied password must pass policy and breach checks; no
    /// password means a throwaway credential.
    pub async fn signup(
        &self,
        email: &str,
        password: Option<&str>,
    ) -> Result<Account, SignupError> {
        let email = email.trim();

        if !is_valid_email(email) {
            return Err(SignupError::InvalidEmail);
        }
        if self.directory.get_by_email(email).await?.is_some() {
            return Err(SignupError::EmailExists);
        }

        // An empty password means "none": the directory generates a
        // throwaway credential instead
        let password = password.filter(|p| !p.trim().is_empty());
        if let Some(pw) = password {
            if !satisfies_policy(pw) {
                return Err(SignupError::InvalidPassword);
            }
            if self.is_trivial(pw).await {
                return Err(SignupError::TrivialPassword);
            }
        }

        let account = match self.directory.create(email, password).await {
            Ok(account) => account,
            Err(e) => {
                self.audit.record(
                    AuditEventKind::AccountCreateFailed,
                    None,
                    AuditLevel::Error,
                    json!({ "message": e.to_string() }),
                );
                return Err(SignupError::ErrorCreatingAccount(e.to_string()));
            }
        };

        self.audit.record(
            AuditEventKind::AccountCreated,
            Some(&account.id),
            AuditLevel::Ok,
            json!({}),
        );

        self.send_verification_email(&account).await;

        Ok(account)
    }

    /// Authenticate by email and password.
    ///
    /// A wrong password is recorded at WARN so future anomaly logic has
    /// something to count.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, LoginError> {
        if !is_valid_email(email) {
            return Err(LoginError::InvalidEmail);
        }

        let Some(account) = self.directory.get_by_email(email).await? else {
            return Err(LoginError::AccountNotFound);
        };

        if !self.directory.verify_password(&account, password) {
            self.audit.record(
                AuditEventKind::AccountInvalidPassword,
                Some(&account.id),
                AuditLevel::Warn,
                json!({}),
            );
            return Err(LoginError::InvalidPassword);
        }

        Ok(account)
    }

    /// Validate, rehash, and store a new password, then terminate every
    /// existing session of the account.
    pub async fn set_password(
        &self,
        account: &Account,
        new_password: &str,
    ) -> Result<Account, SetPasswordError> {
        if !satisfies_policy(new_password) {
            return Err(SetPasswordError::InvalidPassword);
        }
        if self.is_trivial(new_password).await {
            return Err(SetPasswordError::TrivialPassword);
        }

        self.directory
            .update_password(&account.id, new_password)
            .await?;
        self.directory.terminate_all_sessions(&account.id).await?;

        self.audit.record(
            AuditEventKind::AccountPasswordChanged,
            Some(&account.id),
            AuditLevel::Ok,
            json!({}),
        );

        Ok(account.clone())
    }

    /// Change the account's email address.
    ///
    /// Verification state resets and a fresh verification mail goes out
    /// to the new address.
    pub async fn change_email(
        &self,
        account_id: &str,
        new_email: &str,
    ) -> Result<(), ChangeEmailError> {
        let email = new_email.trim();

        if !is_valid_email(email) {
            return Err(ChangeEmailError::InvalidEmail);
        }

        let Some(mut account) = self.directory.get_by_id(account_id).await? else {
            return Err(ChangeEmailError::AccountNotFound);
        };

        if self.directory.get_by_email(email).await?.is_some() {
            return Err(ChangeEmailError::EmailInUse);
        }

        account.set_email(email);

        if !self.directory.update(&account).await? {
            return Err(ChangeEmailError::UpdateFailed);
        }

        self.send_verification_email(&account).await;

        self.audit.record(
            AuditEventKind::AccountEmailChanged,
            Some(&account.id),
            AuditLevel::Ok,
            json!({}),
        );

        Ok(())
    }

    /// Re-send the verification email for a logged-in account
    pub async fn request_verification_email(
        &self,
        account_id: &str,
    ) -> Result<(), ChangeEmailError> {
        let Some(account) = self.directory.get_by_id(account_id).await? else {
            return Err(ChangeEmailError::AccountNotFound);
        };

        self.send_verification_email(&account).await;

        Ok(())
    }

    /// Issue a password reset token and mail the link
    pub async fn request_password_reset(
        &self,
        email: &str,
        user_agent: Option<String>,
    ) -> Result<(), LinkRequestError> {
        let email = email.trim();

        if !is_valid_email(email) {
            return Err(LinkRequestError::InvalidEmail);
        }

        let Some(account) = self.directory.get_by_email(email).await? else {
            return Err(LinkRequestError::AccountNotFound);
        };

        let token = self
            .tokens
            .create_password_reset_token(&account.id, &account.email, user_agent)
            .await?;

        self.mailer
            .send(
                &account.email,
                templates::PASSWORD_RESET_SUBJECT,
                &templates::password_reset_body(&self.config.base_url, &token.id),
            )
            .await;

        self.audit.record(
            AuditEventKind::AccountResetPasswordRequested,
            Some(&account.id),
            AuditLevel::Ok,
            json!({ "token_id": token.id }),
        );

        Ok(())
    }

    /// Redeem a password reset token: set the new password, consume the
    /// token, and verify the email as a side effect when the token was
    /// issued for the address the account still carries.
    pub async fn redeem_password_reset(
        &self,
        token_id: &str,
        new_password: &str,
    ) -> Result<Account, RedeemResetError> {
        let Some(token) = self.tokens.get(token_id, TokenKind::PasswordReset).await? else {
            return Err(RedeemResetError::InvalidToken);
        };

        let Some(account) = self.directory.get_by_id(&token.account_id).await? else {
            return Err(RedeemResetError::AccountNotFound);
        };

        let mut account = match self.set_password(&account, new_password).await {
            Ok(account) => account,
            Err(SetPasswordError::InvalidPassword) => return Err(RedeemResetError::InvalidPassword),
            Err(SetPasswordError::TrivialPassword) => return Err(RedeemResetError::TrivialPassword),
            Err(SetPasswordError::Unavailable(e)) => return Err(RedeemResetError::Unavailable(e)),
        };

        // Single use
        self.tokens.delete(&token.id, TokenKind::PasswordReset).await?;

        if !account.is_verified()
            && token
                .password_reset_payload()
                .is_some_and(|p| p.verify_email == account.email)
        {
            account.mark_verified(self.clock.now_ms());
            self.directory.update(&account).await?;
            self.audit.record(
                AuditEventKind::AccountEmailVerified,
                Some(&account.id),
                AuditLevel::Ok,
                json!({}),
            );
        }

        Ok(account)
    }

    /// Issue a single-use login link and mail it
    pub async fn request_login_link(
        &self,
        email: &str,
        user_agent: Option<String>,
    ) -> Result<(), LinkRequestError> {
        let email = email.trim();

        if !is_valid_email(email) {
            return Err(LinkRequestError::InvalidEmail);
        }

        let Some(account) = self.directory.get_by_email(email).await? else {
            return Err(LinkRequestError::AccountNotFound);
        };

        let token = self
            .tokens
            .create_login_token(&account.id, &account.email, user_agent)
            .await?;

        self.mailer
            .send(
                &account.email,
                templates::LOGIN_LINK_SUBJECT,
                &templates::login_link_body(&self.config.base_url, &token.id),
            )
            .await;

        Ok(())
    }

    /// Redeem a single-use login link.
    ///
    /// Proves control of the mailbox, so an unverified matching address
    /// becomes verified on the way through.
    pub async fn redeem_login_token(&self, token_id: &str) -> Result<Account, LoginTokenError> {
        let Some(token) = self.tokens.get(token_id, TokenKind::Login).await? else {
            return Err(LoginTokenError::InvalidToken);
        };

        let Some(mut account) = self.directory.get_by_id(&token.account_id).await? else {
            return Err(LoginTokenError::AccountNotFound);
        };

        self.tokens.delete(&token.id, TokenKind::Login).await?;

        if !account.is_verified()
            && token
                .login_payload()
                .is_some_and(|p| p.verify_email == account.email)
        {
            account.mark_verified(self.clock.now_ms());
            self.directory.update(&account).await?;
            self.audit.record(
                AuditEventKind::AccountEmailVerified,
                Some(&account.id),
                AuditLevel::Ok,
                json!({}),
            );
        }

        Ok(account)
    }

    /// Redeem an email verification token.
    ///
    /// The verified timestamp moves 0 → now exactly once; a second
    /// redemption leaves it alone.
    pub async fn verify_email(&self, token_id: &str) -> Result<Account, VerifyEmailError> {
        let Some(token) = self.tokens.get(token_id, TokenKind::VerifyEmail).await? else {
            return Err(VerifyEmailError::InvalidToken);
        };

        let Some(mut account) = self.directory.get_by_id(&token.account_id).await? else {
            return Err(VerifyEmailError::AccountNotFound);
        };

        if !account.is_verified() {
            account.mark_verified(self.clock.now_ms());
            if !self.directory.update(&account).await? {
                self.audit.record(
                    AuditEventKind::SystemError,
                    Some(&account.id),
                    AuditLevel::Error,
                    json!({ "message": "failed to set verified status" }),
                );
            } else {
                self.audit.record(
                    AuditEventKind::AccountEmailVerified,
                    Some(&account.id),
                    AuditLevel::Ok,
                    json!({}),
                );
            }
        }

        Ok(account)
    }

    /// Delete the account behind a tombstone and audit the outcome.
    ///
    /// Remaining sessions are terminated either way.
    pub async fn delete_account(&self, account: &Account) -> AuthResult<Option<Tombstone>> {
        let tombstone = self.directory.delete_and_tombstone(account).await;

        match &tombstone {
            Some(_) => self.audit.record(
                AuditEventKind::AccountDeleted,
                Some(&account.id),
                AuditLevel::Ok,
                json!({}),
            ),
            None => self.audit.record(
                AuditEventKind::AccountDeleteFailed,
                Some(&account.id),
                AuditLevel::Error,
                json!({ "message": "no tombstone returned" }),
            ),
        }

        self.directory.terminate_all_sessions(&account.id).await?;

        Ok(tombstone)
    }

    /// Record a failed re-authentication attempt (login or elevation)
    pub fn record_invalid_password(&self, account_id: &str) {
        self.audit.record(
            AuditEventKind::AccountInvalidPassword,
            Some(account_id),
            AuditLevel::Warn,
            json!({}),
        );
    }

    async fn is_trivial(&self, password: &str) -> bool {
        self.repo.contains(&password.to_lowercase()).await
    }

    async fn send_verification_email(&self, account: &Account) {
        let token = match self
            .tokens
            .create_verify_email_token(&account.id, &account.email)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                // Fire-and-forget: the user can request another mail later
                tracing::error!(account_id = %account.id, error = %e, "failed to issue verification token");
                return;
            }
        };

        self.mailer
            .send(
                &account.email,
                templates::VERIFY_SUBJECT,
                &templates::verify_body(&self.config.base_url, &token.id),
            )
            .await;
    }
}
