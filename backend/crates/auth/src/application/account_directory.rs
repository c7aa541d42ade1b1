//! Account Directory
//!
//! Account CRUD, password hashing, and tombstone-based deletion.

use std::sync::Arc;

use platform::clock::Clock;
use platform::crypto::generate_secure_token;
use platform::password::{ClearTextPassword, HashedPassword};

use crate::application::config::AuthConfig;
use crate::domain::entity::account::Account;
use crate::domain::entity::tombstone::Tombstone;
use crate::domain::repository::{AccountRepository, TokenRepository};
use crate::error::AuthResult;

const TOMBSTONE_REASON_USER_DELETED: &str = "user_deleted";

pub struct AccountDirectory<R>
where
    R: AccountRepository + TokenRepository + Clone + Send + Sync + 'static,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<R> Clone for AccountDirectory<R>
where
    R: AccountRepository + TokenRepository + Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<R> AccountDirectory<R>
where
    R: AccountRepository + TokenRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            config,
            clock,
        }
    }

    /// Find an account by email (case-insensitive collation)
    pub async fn get_by_email(&self, email: &str) -> AuthResult<Option<Account>> {
        self.repo.account_by_email(email).await
    }

    pub async fn get_by_id(&self, id: &str) -> AuthResult<Option<Account>> {
        self.repo.account_by_id(id).await
    }

    /// Create an account.
    ///
    /// Without a supplied password the account receives a high-entropy
    /// throwaway credential that is never surfaced; password login stays
    /// impossible until a reset sets a real one.
    pub async fn create(&self, email: &str, password: Option<&str>) -> AuthResult<Account> {
        let clear = match password {
            Some(p) => ClearTextPassword::new(p.to_string()),
            None => ClearTextPassword::generate_throwaway(),
        };
        let hash = clear.hash()?;

        let account = Account::new(
            generate_secure_token(self.config.account_id_length),
            email,
            hash.as_phc_string().to_string(),
            self.clock.now_ms(),
        );

        self.repo.insert_account(&account).await?;

        Ok(account)
    }

    /// Persist email / verification changes
    pub async fn update(&self, account: &Account) -> AuthResult<bool> {
        self.repo.update_account(account, self.clock.now_ms()).await
    }

    /// Rehash and store a new password
    pub async fn update_password(&self, id: &str, new_password: &str) -> AuthResult<bool> {
        let hash = ClearTextPassword::new(new_password.to_string()).hash()?;
        self.repo
            .update_account_password(id, hash.as_phc_string(), self.clock.now_ms())
            .await
    }

    /// Check a candidate password against the stored hash.
    ///
    /// An unparsable stored hash means "no match", never an error.
    pub fn verify_password(&self, account: &Account, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }

        match HashedPassword::from_phc_string(&account.password) {
            Ok(hash) => hash.verify(&ClearTextPassword::new(candidate.to_string())),
            Err(_) => {
                tracing::error!(account_id = %account.id, "stored password hash is unparsable");
                false
            }
        }
    }

    /// Bulk-delete every session token of the account
    pub async fn terminate_all_sessions(&self, account_id: &str) -> AuthResult<u64> {
        self.repo.delete_session_tokens_for_account(account_id).await
    }

    /// Delete the account and insert its tombstone atomically.
    ///
    /// On transaction failure neither side applies; the failure is
    /// logged and reported as `None` so callers can audit it.
    pub async fn delete_and_tombstone(&self, account: &Account) -> Option<Tombstone> {
        let tombstone =
            Tombstone::for_account(account, TOMBSTONE_REASON_USER_DELETED, self.clock.now_ms());

        match self
            .repo
            .delete_account_with_tombstone(&account.id, &tombstone)
            .await
        {
            Ok(()) => Some(tombstone),
            Err(e) => {
                tracing::error!(account_id = %account.id, error = %e, "failed to delete account");
                None
            }
        }
    }
}
