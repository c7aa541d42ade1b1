//! SQLite Repository Implementations
//!
//! One storage handle implements every persistence trait the subsystem
//! needs. The handle is injected at construction so tests substitute an
//! isolated in-memory instance per run.

use sqlx::SqlitePool;

use platform::password::BreachListLookup;

use crate::domain::entity::account::{Account, AccountRole};
use crate::domain::entity::token::{Token, TokenKind, TokenPayload};
use crate::domain::entity::tombstone::Tombstone;
use crate::domain::repository::{AccountRepository, TokenRepository};
use crate::error::AuthResult;

/// SQLite-backed repository
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ============================================================================
// Token Repository Implementation
// ============================================================================

impl TokenRepository for SqliteStore {
    async fn insert_token(&self, token: &Token) -> AuthResult<()> {
        let payload = TokenPayload::marshal(token.payload.as_ref());

        sqlx::query(
            r#"
            INSERT INTO tokens (id, created, expires, account_id, kind, payload)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token.id)
        .bind(token.created)
        .bind(token.expires)
        .bind(&token.account_id)
        .bind(token.kind.code())
        .bind(payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_token(&self, id: &str, kind: TokenKind) -> AuthResult<Option<Token>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT id, created, expires, account_id, kind, payload
            FROM tokens
            WHERE id = ? AND kind = ?
            "#,
        )
        .bind(id)
        .bind(kind.code())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_token(kind)))
    }

    async fn delete_token(&self, id: &str, kind: TokenKind) -> AuthResult<()> {
        sqlx::query("DELETE FROM tokens WHERE id = ? AND kind = ?")
            .bind(id)
            .bind(kind.code())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_token_payload(
        &self,
        id: &str,
        kind: TokenKind,
        payload: &TokenPayload,
    ) -> AuthResult<bool> {
        let raw = TokenPayload::marshal(Some(payload));

        let result = sqlx::query("UPDATE tokens SET payload = ? WHERE id = ? AND kind = ?")
            .bind(raw)
            .bind(id)
            .bind(kind.code())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn session_tokens_for_account(&self, account_id: &str) -> AuthResult<Vec<Token>> {
        let rows = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT id, created, expires, account_id, kind, payload
            FROM tokens
            WHERE account_id = ? AND kind = ?
            ORDER BY created DESC
            "#,
        )
        .bind(account_id)
        .bind(TokenKind::Session.code())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| r.into_token(TokenKind::Session))
            .collect())
    }

    async fn delete_session_tokens_for_account(&self, account_id: &str) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM tokens WHERE account_id = ? AND kind = ?")
            .bind(account_id)
            .bind(TokenKind::Session.code())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired_tokens(&self, now_ms: i64) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM tokens WHERE expires <= ?")
            .bind(now_ms)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for SqliteStore {
    async fn insert_account(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, created, updated, email, password, email_verified, role)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(account.created)
        .bind(account.updated)
        .bind(&account.email)
        .bind(&account.password)
        .bind(account.email_verified)
        .bind(account.role.code())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn account_by_id(&self, id: &str) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, created, updated, email, password, email_verified, role
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AccountRow::into_account))
    }

    async fn account_by_email(&self, email: &str) -> AuthResult<Option<Account>> {
        // The email column carries COLLATE NOCASE, so equality here is
        // already case-insensitive
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, created, updated, email, password, email_verified, role
            FROM accounts
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AccountRow::into_account))
    }

    async fn update_account(&self, account: &Account, now_ms: i64) -> AuthResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET email = ?, email_verified = ?, updated = ?
            WHERE id = ?
            "#,
        )
        .bind(&account.email)
        .bind(account.email_verified)
        .bind(now_ms)
        .bind(&account.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_account_password(
        &self,
        id: &str,
        password_hash: &str,
        now_ms: i64,
    ) -> AuthResult<bool> {
        let result = sqlx::query("UPDATE accounts SET password = ?, updated = ? WHERE id = ?")
            .bind(password_hash)
            .bind(now_ms)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_account_with_tombstone(
        &self,
        account_id: &str,
        tombstone: &Tombstone,
    ) -> AuthResult<()> {
        // An early return rolls the transaction back on drop
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tombstones (id, email, reason, created, deleted, pruned)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tombstone.id)
        .bind(&tombstone.email)
        .bind(&tombstone.reason)
        .bind(tombstone.created)
        .bind(tombstone.deleted)
        .bind(tombstone.pruned)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}

// ============================================================================
// Breach Corpus Lookup Implementation
// ============================================================================

impl BreachListLookup for SqliteStore {
    async fn contains(&self, lowercased_password: &str) -> bool {
        let result = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM trivial_passwords WHERE password = ? LIMIT 1",
        )
        .bind(lowercased_password)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(row) => row.is_some(),
            Err(e) => {
                // A degraded corpus must not block signups
                tracing::error!(error = %e, "breach corpus lookup failed");
                false
            }
        }
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: String,
    created: i64,
    expires: i64,
    account_id: String,
    #[allow(dead_code)]
    kind: String,
    payload: String,
}

impl TokenRow {
    fn into_token(self, kind: TokenKind) -> Token {
        let payload = TokenPayload::unmarshal(kind, &self.payload);

        Token {
            id: self.id,
            created: self.created,
            expires: self.expires,
            account_id: self.account_id,
            kind,
            payload,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: String,
    created: i64,
    updated: i64,
    email: String,
    password: String,
    email_verified: i64,
    role: String,
}

impl AccountRow {
    fn into_account(self) -> Account {
        Account {
            id: self.id,
            created: self.created,
            updated: self.updated,
            email: self.email,
            password: self.password,
            email_verified: self.email_verified,
            role: AccountRole::from_code(&self.role),
        }
    }
}
