//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in the
//! infrastructure layer. Method names are distinct across traits so one
//! storage handle can implement all of them without call-site ambiguity.

use crate::domain::entity::account::Account;
use crate::domain::entity::token::{Token, TokenKind, TokenPayload};
use crate::domain::entity::tombstone::Tombstone;
use crate::error::AuthResult;

/// Token repository trait
#[trait_variant::make(TokenRepository: Send)]
pub trait LocalTokenRepository {
    /// Insert a new token row
    async fn insert_token(&self, token: &Token) -> AuthResult<()>;

    /// Fetch a token by id and kind; expiry is NOT checked here
    async fn fetch_token(&self, id: &str, kind: TokenKind) -> AuthResult<Option<Token>>;

    /// Delete a token by id and kind
    async fn delete_token(&self, id: &str, kind: TokenKind) -> AuthResult<()>;

    /// Replace the stored payload; returns whether a row was updated
    async fn update_token_payload(
        &self,
        id: &str,
        kind: TokenKind,
        payload: &TokenPayload,
    ) -> AuthResult<bool>;

    /// All session tokens belonging to an account
    async fn session_tokens_for_account(&self, account_id: &str) -> AuthResult<Vec<Token>>;

    /// Bulk-delete all session tokens for an account
    async fn delete_session_tokens_for_account(&self, account_id: &str) -> AuthResult<u64>;

    /// Remove every token past its expiry
    async fn delete_expired_tokens(&self, now_ms: i64) -> AuthResult<u64>;
}

/// Account repository trait
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Insert a new account row
    async fn insert_account(&self, account: &Account) -> AuthResult<()>;

    /// Find an account by id
    async fn account_by_id(&self, id: &str) -> AuthResult<Option<Account>>;

    /// Find an account by email, case-insensitively
    async fn account_by_email(&self, email: &str) -> AuthResult<Option<Account>>;

    /// Update email / verification state; returns whether a row changed
    async fn update_account(&self, account: &Account, now_ms: i64) -> AuthResult<bool>;

    /// Replace the password hash; returns whether a row changed
    async fn update_account_password(
        &self,
        id: &str,
        password_hash: &str,
        now_ms: i64,
    ) -> AuthResult<bool>;

    /// Insert the tombstone and remove the account row in one
    /// transaction. Either both happen or neither does.
    async fn delete_account_with_tombstone(
        &self,
        account_id: &str,
        tombstone: &Tombstone,
    ) -> AuthResult<()>;
}
