//! Unit tests for the auth crate
//!
//! Storage-backed tests run against an isolated in-memory SQLite
//! instance per test, with a manually advanced clock so expiry logic is
//! exercised without sleeping.

use std::sync::Arc;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use audit::{AuditEventKind, AuditStore, AuditTrail, AuditWorker, HandlerRegistry, QueryPage};
use platform::clock::{Clock, DAYS, HOURS, MINUTES, ManualClock};
use platform::cookie::{CookieUpdate, SameSite};
use platform::crypto::is_valid_token;

use crate::application::account_service::{
    AccountService, ChangeEmailError, LinkRequestError, LoginError, LoginTokenError,
    RedeemResetError, SignupError, VerifyEmailError,
};
use crate::application::config::AuthConfig;
use crate::application::session::SessionManager;
use crate::application::token_store::TokenStore;
use crate::domain::entity::account::Account;
use crate::domain::entity::token::{
    Flash, FlashKind, LoginPayload, Token, TokenKind, TokenPayload,
};
use crate::domain::repository::TokenRepository;
use crate::infra::mailer::RecordingMailer;
use crate::infra::sqlite::SqliteStore;

const T0: i64 = 1_700_000_000_000;

struct TestEnv {
    pool: SqlitePool,
    repo: Arc<SqliteStore>,
    clock: Arc<ManualClock>,
    tokens: TokenStore<SqliteStore>,
    sessions: SessionManager<SqliteStore>,
    service: AccountService<SqliteStore, RecordingMailer>,
    mailer: RecordingMailer,
    audit_store: AuditStore,
    audit_worker: AuditWorker,
}

async fn env() -> TestEnv {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let clock = Arc::new(ManualClock::new(T0));
    let clock_handle: Arc<dyn Clock> = clock.clone();
    let config = Arc::new(AuthConfig::development());
    let repo = Arc::new(SqliteStore::new(pool.clone()));
    let audit_store = AuditStore::new(pool.clone());
    let (trail, audit_worker) = AuditTrail::new(
        audit_store.clone(),
        HandlerRegistry::new(),
        clock_handle.clone(),
    );
    let mailer = RecordingMailer::default();

    TestEnv {
        tokens: TokenStore::new(repo.clone(), config.clone(), clock_handle.clone()),
        sessions: SessionManager::new(repo.clone(), config.clone(), clock_handle.clone()),
        service: AccountService::new(
            repo.clone(),
            trail,
            Arc::new(mailer.clone()),
            config,
            clock_handle,
        ),
        pool,
        repo,
        clock,
        mailer,
        audit_store,
        audit_worker,
    }
}

impl TestEnv {
    async fn account(&self, email: &str, password: &str) -> Account {
        self.service
            .signup(email, Some(password))
            .await
            .expect("signup should succeed")
    }

    /// Drain the audit queue and return the persisted kinds for one account
    async fn drained_kinds(&mut self, account_id: &str) -> Vec<AuditEventKind> {
        self.audit_worker.drain_pending().await;
        self.audit_store
            .events_for_account(account_id, QueryPage::default())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    /// Re-fetch a session to see its current stored payload
    async fn fresh(&self, session: &Token) -> Token {
        self.tokens
            .get(&session.id, TokenKind::Session)
            .await
            .unwrap()
            .expect("session should exist")
    }

    async fn add_trivial(&self, password: &str) {
        sqlx::query("INSERT INTO trivial_passwords (password) VALUES (?)")
            .bind(password)
            .execute(&self.pool)
            .await
            .unwrap();
    }

    async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(&self.pool).await.unwrap()
    }
}

fn cookie_value(update: &CookieUpdate) -> String {
    match update {
        CookieUpdate::Set { value, .. } => value.clone(),
        CookieUpdate::Clear { .. } => panic!("expected a set-cookie update"),
    }
}

/// Token id from a mail body like ".../verify-email?token=XYZ"
fn token_from_query(body: &str) -> String {
    body.split("token=").nth(1).expect("token in body").to_string()
}

// ============================================================================
// Token store
// ============================================================================

mod token_store_tests {
    use super::*;

    #[tokio::test]
    async fn create_get_roundtrip_and_expiry() {
        let env = env().await;

        let token = env
            .tokens
            .create_verify_email_token("acc1", "a@b.com")
            .await
            .unwrap();

        assert_eq!(token.id.len(), 32);
        assert!(is_valid_token(&token.id));
        assert_eq!(token.created, T0);
        assert_eq!(token.expires, T0 + 60 * DAYS);
        assert!(token.expires > token.created);

        let fetched = env
            .tokens
            .get(&token.id, TokenKind::VerifyEmail)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            fetched.verify_email_payload().map(|p| p.email.as_str()),
            Some("a@b.com")
        );

        // Same id under a different kind is a miss
        assert!(env.tokens.get(&token.id, TokenKind::Login).await.unwrap().is_none());

        // Live right up to the expiry instant, gone at it
        env.clock.set(token.expires - 1);
        assert!(env.tokens.get(&token.id, TokenKind::VerifyEmail).await.unwrap().is_some());

        env.clock.set(token.expires);
        assert!(env.tokens.get(&token.id, TokenKind::VerifyEmail).await.unwrap().is_none());

        // The expired row was purged lazily
        assert!(
            env.repo
                .fetch_token(&token.id, TokenKind::VerifyEmail)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn malformed_ids_never_reach_storage() {
        let env = env().await;

        assert!(env.tokens.get("", TokenKind::Session).await.unwrap().is_none());
        assert!(env.tokens.get("has space", TokenKind::Session).await.unwrap().is_none());
        assert!(env.tokens.get("sql'inject", TokenKind::Session).await.unwrap().is_none());
        assert!(
            env.tokens
                .get(&"a".repeat(257), TokenKind::Session)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn custom_id_length() {
        let env = env().await;

        let payload = TokenPayload::Login(LoginPayload {
            verify_email: "a@b.com".into(),
            user_agent: None,
        });
        let token = env
            .tokens
            .create("acc1", T0 + MINUTES, TokenKind::Login, Some(payload), Some(64))
            .await
            .unwrap();

        assert_eq!(token.id.len(), 64);
        assert!(is_valid_token(&token.id));
    }

    #[tokio::test]
    async fn update_payload_reports_row_presence() {
        let env = env().await;

        let session = env.tokens.create_session_token("acc1", None).await.unwrap();
        let mut payload = session.session_payload_or_default();
        payload.last_activity = Some(T0);

        let updated = env
            .tokens
            .update_payload(&session.id, TokenKind::Session, &TokenPayload::Session(payload.clone()))
            .await
            .unwrap();
        assert!(updated);

        env.tokens.delete(&session.id, TokenKind::Session).await.unwrap();

        let updated = env
            .tokens
            .update_payload(&session.id, TokenKind::Session, &TokenPayload::Session(payload))
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_tokens() {
        let env = env().await;

        let short_a = env
            .tokens
            .create_password_reset_token("acc1", "a@b.com", None)
            .await
            .unwrap();
        let short_b = env
            .tokens
            .create_login_token("acc1", "a@b.com", None)
            .await
            .unwrap();
        let long = env
            .tokens
            .create_verify_email_token("acc1", "a@b.com")
            .await
            .unwrap();

        // Both 15-minute tokens lapse, the 60-day one survives
        env.clock.advance(16 * MINUTES);

        let deleted = env.tokens.sweep_expired().await.unwrap();
        assert_eq!(deleted, 2);

        assert!(env.repo.fetch_token(&short_a.id, TokenKind::PasswordReset).await.unwrap().is_none());
        assert!(env.repo.fetch_token(&short_b.id, TokenKind::Login).await.unwrap().is_none());
        assert!(env.tokens.get(&long.id, TokenKind::VerifyEmail).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn corrupt_payload_reads_as_absent() {
        let env = env().await;

        let session = env
            .tokens
            .create_session_token("acc1", Some("ua".into()))
            .await
            .unwrap();

        sqlx::query("UPDATE tokens SET payload = ? WHERE id = ?")
            .bind("{definitely not json")
            .bind(&session.id)
            .execute(&env.pool)
            .await
            .unwrap();

        let fetched = env
            .tokens
            .get(&session.id, TokenKind::Session)
            .await
            .unwrap()
            .unwrap();
        assert!(fetched.payload.is_none());
        assert_eq!(fetched.session_payload_or_default(), Default::default());
    }
}

// ============================================================================
// Session manager
// ============================================================================

mod session_tests {
    use super::*;

    #[tokio::test]
    async fn session_cookie_shape() {
        let env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;

        let (session, cookie) = env
            .sessions
            .create_session(&account.id, Some("ua/1.0".into()))
            .await
            .unwrap();

        match &cookie {
            CookieUpdate::Set { config, value } => {
                assert_eq!(value, &session.id);
                assert_eq!(config.name, "sid");
                assert_eq!(config.same_site, SameSite::Lax);
                assert!(config.http_only);
                assert_eq!(config.max_age_secs, Some(30 * 24 * 3600));
            }
            CookieUpdate::Clear { .. } => panic!("expected a set-cookie update"),
        }
    }

    #[tokio::test]
    async fn resolve_contract() {
        let env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;
        let (session, _) = env
            .sessions
            .create_session(&account.id, Some("ua/1.0".into()))
            .await
            .unwrap();

        // Authenticated: session and account bound, no cookie changes
        let resolved = env.sessions.resolve(Some(&session.id)).await.unwrap();
        assert!(resolved.is_authenticated());
        assert_eq!(resolved.account.as_ref().map(|a| a.id.as_str()), Some(account.id.as_str()));
        assert!(resolved.cookie_updates.is_empty());

        // No cookie: unauthenticated, nothing to clear
        let resolved = env.sessions.resolve(None).await.unwrap();
        assert!(!resolved.is_authenticated());
        assert!(resolved.cookie_updates.is_empty());

        // Unknown token: unauthenticated and the stale cookie is cleared
        let resolved = env
            .sessions
            .resolve(Some("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"))
            .await
            .unwrap();
        assert!(!resolved.is_authenticated());
        assert_eq!(resolved.cookie_updates.len(), 1);
        assert!(matches!(
            &resolved.cookie_updates[0],
            CookieUpdate::Clear { config } if config.name == "sid"
        ));
    }

    #[tokio::test]
    async fn expired_session_clears_cookie_and_row() {
        let env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;
        let (session, _) = env.sessions.create_session(&account.id, None).await.unwrap();

        env.clock.advance(30 * DAYS);

        let resolved = env.sessions.resolve(Some(&session.id)).await.unwrap();
        assert!(!resolved.is_authenticated());
        assert_eq!(resolved.cookie_updates.len(), 1);

        // The row is gone, not just hidden
        assert!(
            env.repo
                .fetch_token(&session.id, TokenKind::Session)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn orphan_session_is_purged() {
        let env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;
        let (session, _) = env.sessions.create_session(&account.id, None).await.unwrap();

        sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(&account.id)
            .execute(&env.pool)
            .await
            .unwrap();

        let resolved = env.sessions.resolve(Some(&session.id)).await.unwrap();
        assert!(!resolved.is_authenticated());
        assert_eq!(resolved.cookie_updates.len(), 1);
        assert!(
            env.repo
                .fetch_token(&session.id, TokenKind::Session)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn elevation_lifecycle() {
        let env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;
        let (session, _) = env.sessions.create_session(&account.id, None).await.unwrap();

        let cookie = env.sessions.elevate(&session).await.unwrap();
        let value = cookie_value(&cookie);
        match &cookie {
            CookieUpdate::Set { config, .. } => {
                assert_eq!(config.name, "priv");
                assert_eq!(config.same_site, SameSite::Strict);
                assert_eq!(config.max_age_secs, Some(600));
            }
            CookieUpdate::Clear { .. } => panic!("expected a set-cookie update"),
        }

        let session = env.fresh(&session).await;
        assert!(env.sessions.is_elevated(&session, Some(&value)));
        assert_eq!(env.sessions.remaining_elevation(&session), 10 * MINUTES);

        env.clock.advance(4 * MINUTES);
        assert!(env.sessions.is_elevated(&session, Some(&value)));
        assert_eq!(env.sessions.remaining_elevation(&session), 6 * MINUTES);

        // Missing companion cookie fails even though the payload holds a token
        assert!(!env.sessions.is_elevated(&session, None));

        // A single differing character fails
        let mut tampered = value.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });
        assert!(!env.sessions.is_elevated(&session, Some(&tampered)));

        // TTL lapse fails
        env.clock.advance(6 * MINUTES + 1);
        assert!(!env.sessions.is_elevated(&session, Some(&value)));
        assert_eq!(env.sessions.remaining_elevation(&session), 0);
    }

    #[tokio::test]
    async fn clear_elevation_removes_both_channels() {
        let env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;
        let (session, _) = env.sessions.create_session(&account.id, None).await.unwrap();

        let value = cookie_value(&env.sessions.elevate(&session).await.unwrap());

        let cleared = env.sessions.clear_elevation(&session).await.unwrap();
        assert!(matches!(
            &cleared,
            CookieUpdate::Clear { config } if config.name == "priv"
        ));

        let session = env.fresh(&session).await;
        let payload = session.session_payload().unwrap();
        assert!(payload.privilege_elevation_token.is_none());
        assert!(payload.privilege_elevated_at.is_none());

        // The old cookie value alone proves nothing
        assert!(!env.sessions.is_elevated(&session, Some(&value)));
    }

    #[tokio::test]
    async fn elevation_survives_other_payload_writes() {
        let env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;
        let (session, _) = env.sessions.create_session(&account.id, None).await.unwrap();

        let value = cookie_value(&env.sessions.elevate(&session).await.unwrap());

        // A flash write against the stale in-memory session must not
        // wipe the elevation stored since
        env.sessions
            .set_flash(
                &session,
                Flash {
                    kind: FlashKind::Info,
                    message: "hello".into(),
                },
            )
            .await
            .unwrap();

        let session = env.fresh(&session).await;
        assert!(env.sessions.is_elevated(&session, Some(&value)));
        assert!(session.session_payload().unwrap().flash.is_some());
    }

    #[tokio::test]
    async fn activity_tracking_snapshots_previous_visit() {
        let env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;
        let (session, _) = env.sessions.create_session(&account.id, None).await.unwrap();

        env.sessions.touch_activity(&session).await.unwrap();
        let payload = env.fresh(&session).await.session_payload_or_default();
        assert_eq!(payload.last_activity, Some(T0));
        assert_eq!(payload.previous_visit, None);

        // Within the refresh window: no snapshot
        env.clock.advance(30 * MINUTES);
        env.sessions.touch_activity(&session).await.unwrap();
        let payload = env.fresh(&session).await.session_payload_or_default();
        assert_eq!(payload.last_activity, Some(T0 + 30 * MINUTES));
        assert_eq!(payload.previous_visit, None);

        // After more than an hour idle the prior activity becomes the
        // previous distinct visit
        env.clock.advance(2 * HOURS);
        env.sessions.touch_activity(&session).await.unwrap();
        let payload = env.fresh(&session).await.session_payload_or_default();
        assert_eq!(payload.previous_visit, Some(T0 + 30 * MINUTES));
        assert_eq!(payload.last_activity, Some(T0 + 30 * MINUTES + 2 * HOURS));
    }

    #[tokio::test]
    async fn flash_is_read_once() {
        let env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;
        let (session, _) = env.sessions.create_session(&account.id, None).await.unwrap();

        env.sessions
            .set_flash(
                &session,
                Flash {
                    kind: FlashKind::Success,
                    message: "saved".into(),
                },
            )
            .await
            .unwrap();

        let flash = env.sessions.consume_flash(&session).await.unwrap();
        assert_eq!(
            flash,
            Some(Flash {
                kind: FlashKind::Success,
                message: "saved".into()
            })
        );

        // Consumed means gone, both from reads and from storage
        assert_eq!(env.sessions.consume_flash(&session).await.unwrap(), None);
        assert!(env.fresh(&session).await.session_payload_or_default().flash.is_none());
    }

    #[tokio::test]
    async fn logout_revoke_and_logout_all() {
        let env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;
        let other = env.account("other@example.com", "correct horse battery").await;

        let (s1, _) = env.sessions.create_session(&account.id, None).await.unwrap();
        let (s2, _) = env.sessions.create_session(&account.id, None).await.unwrap();
        let (s3, _) = env.sessions.create_session(&account.id, None).await.unwrap();
        let (foreign, _) = env.sessions.create_session(&other.id, None).await.unwrap();

        let cookie = env.sessions.logout(&s1).await.unwrap();
        assert!(matches!(cookie, CookieUpdate::Clear { .. }));
        assert!(env.tokens.get(&s1.id, TokenKind::Session).await.unwrap().is_none());

        // Revocation only touches the caller's own sessions
        assert!(env.sessions.revoke_session(&account.id, &s2.id).await.unwrap());
        assert!(!env.sessions.revoke_session(&account.id, &foreign.id).await.unwrap());
        assert!(!env.sessions.revoke_session(&account.id, "nonexistent").await.unwrap());

        let (deleted, _) = env.sessions.logout_all(&account.id).await.unwrap();
        assert_eq!(deleted, 1); // only s3 was left
        assert!(env.sessions.sessions_for_account(&account.id).await.unwrap().is_empty());

        // The other account's session is untouched
        assert!(env.tokens.get(&foreign.id, TokenKind::Session).await.unwrap().is_some());
    }
}

// ============================================================================
// Account service
// ============================================================================

mod account_service_tests {
    use super::*;

    #[tokio::test]
    async fn signup_creates_account_and_sends_verification() {
        let mut env = env().await;

        let account = env
            .service
            .signup("user@example.com", Some("correct horse battery"))
            .await
            .unwrap();

        assert_eq!(account.id.len(), 13);
        assert!(is_valid_token(&account.id));
        assert_eq!(account.email, "user@example.com");
        assert_eq!(account.created, T0);
        assert_eq!(account.updated, 0);
        assert!(!account.is_verified());
        assert!(account.password.starts_with("$argon2"));

        // One verification mail carrying a live token
        let sent = env.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "user@example.com");
        let token_id = token_from_query(&sent[0].2);
        assert!(
            env.tokens
                .get(&token_id, TokenKind::VerifyEmail)
                .await
                .unwrap()
                .is_some()
        );

        let kinds = env.drained_kinds(&account.id).await;
        assert!(kinds.contains(&AuditEventKind::AccountCreated));
    }

    #[tokio::test]
    async fn signup_invalid_email_has_no_side_effects() {
        let mut env = env().await;

        let result = env.service.signup("not-an-email", Some("whatever else")).await;
        assert!(matches!(result, Err(SignupError::InvalidEmail)));

        assert_eq!(env.count("SELECT COUNT(*) FROM accounts").await, 0);
        assert!(env.mailer.sent().is_empty());

        env.audit_worker.drain_pending().await;
        assert_eq!(env.count("SELECT COUNT(*) FROM audit_events").await, 0);
    }

    #[tokio::test]
    async fn signup_rejects_duplicate_email_case_insensitively() {
        let env = env().await;
        env.account("user@example.com", "correct horse battery").await;

        let result = env
            .service
            .signup("User@EXAMPLE.com", Some("some other password"))
            .await;
        assert!(matches!(result, Err(SignupError::EmailExists)));
        assert_eq!(env.count("SELECT COUNT(*) FROM accounts").await, 1);
    }

    #[tokio::test]
    async fn signup_enforces_policy_and_breach_corpus() {
        let env = env().await;

        let result = env.service.signup("a@b.com", Some("short")).await;
        assert!(matches!(result, Err(SignupError::InvalidPassword)));

        env.add_trivial("password123").await;
        let result = env.service.signup("a@b.com", Some("PASSWORD123")).await;
        assert!(matches!(result, Err(SignupError::TrivialPassword)));

        assert_eq!(env.count("SELECT COUNT(*) FROM accounts").await, 0);
    }

    #[tokio::test]
    async fn signup_without_password_gets_unusable_credential() {
        let env = env().await;

        let account = env.service.signup("user@example.com", None).await.unwrap();
        assert!(account.password.starts_with("$argon2"));

        // Nobody knows the throwaway credential, so password login is
        // impossible until a reset
        let result = env.service.login("user@example.com", "").await;
        assert!(matches!(result, Err(LoginError::InvalidPassword)));
        let result = env.service.login("user@example.com", "any guess at all").await;
        assert!(matches!(result, Err(LoginError::InvalidPassword)));
    }

    #[tokio::test]
    async fn login_outcomes() {
        let mut env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;

        let logged_in = env
            .service
            .login("user@example.com", "correct horse battery")
            .await
            .unwrap();
        assert_eq!(logged_in.id, account.id);

        assert!(matches!(
            env.service.login("not-an-email", "x").await,
            Err(LoginError::InvalidEmail)
        ));

        // Email-not-found stays distinguishable: explicit UX trade-off
        assert!(matches!(
            env.service.login("ghost@example.com", "whatever").await,
            Err(LoginError::AccountNotFound)
        ));

        assert!(matches!(
            env.service.login("user@example.com", "wrong password").await,
            Err(LoginError::InvalidPassword)
        ));

        let kinds = env.drained_kinds(&account.id).await;
        assert!(kinds.contains(&AuditEventKind::AccountInvalidPassword));
    }

    #[tokio::test]
    async fn set_password_invalidates_every_session() {
        let mut env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;

        env.sessions.create_session(&account.id, None).await.unwrap();
        env.sessions.create_session(&account.id, None).await.unwrap();

        env.service
            .set_password(&account, "a brand new passphrase")
            .await
            .unwrap();

        assert!(env.sessions.sessions_for_account(&account.id).await.unwrap().is_empty());

        assert!(matches!(
            env.service.login("user@example.com", "correct horse battery").await,
            Err(LoginError::InvalidPassword)
        ));
        assert!(
            env.service
                .login("user@example.com", "a brand new passphrase")
                .await
                .is_ok()
        );

        let kinds = env.drained_kinds(&account.id).await;
        assert!(kinds.contains(&AuditEventKind::AccountPasswordChanged));
    }

    #[tokio::test]
    async fn change_email_conflict_leaves_original_untouched() {
        let env = env().await;
        env.account("one@example.com", "correct horse battery").await;
        let account = env.account("two@example.com", "correct horse battery").await;

        let result = env.service.change_email(&account.id, "One@Example.COM").await;
        assert!(matches!(result, Err(ChangeEmailError::EmailInUse)));

        let unchanged = env
            .service
            .directory()
            .get_by_id(&account.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.email, "two@example.com");

        assert!(matches!(
            env.service.change_email(&account.id, "not-an-email").await,
            Err(ChangeEmailError::InvalidEmail)
        ));
        assert!(matches!(
            env.service.change_email("missing-account", "new@example.com").await,
            Err(ChangeEmailError::AccountNotFound)
        ));
    }

    #[tokio::test]
    async fn change_email_resets_verification_and_notifies() {
        let mut env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;

        // Verify first so the reset is observable
        let sent = env.mailer.sent();
        let token_id = token_from_query(&sent[0].2);
        env.service.verify_email(&token_id).await.unwrap();

        env.service
            .change_email(&account.id, "fresh@example.com")
            .await
            .unwrap();

        let updated = env
            .service
            .directory()
            .get_by_id(&account.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.email, "fresh@example.com");
        assert_eq!(updated.email_verified, 0);
        assert!(updated.updated > 0);

        // The latest mail goes to the new address
        let sent = env.mailer.sent();
        assert_eq!(sent.last().unwrap().0, "fresh@example.com");

        let kinds = env.drained_kinds(&account.id).await;
        assert!(kinds.contains(&AuditEventKind::AccountEmailChanged));
        assert!(kinds.contains(&AuditEventKind::AccountEmailVerified));
    }

    #[tokio::test]
    async fn verify_email_transitions_exactly_once() {
        let env = env().await;
        env.account("user@example.com", "correct horse battery").await;
        let token_id = token_from_query(&env.mailer.sent()[0].2);

        env.clock.advance(5 * MINUTES);
        let verified = env.service.verify_email(&token_id).await.unwrap();
        assert_eq!(verified.email_verified, T0 + 5 * MINUTES);

        // A second redemption leaves the timestamp alone
        env.clock.advance(5 * MINUTES);
        let verified_again = env.service.verify_email(&token_id).await.unwrap();
        assert_eq!(verified_again.email_verified, T0 + 5 * MINUTES);

        assert!(matches!(
            env.service.verify_email("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").await,
            Err(VerifyEmailError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn expired_verification_token_is_rejected() {
        let env = env().await;
        env.account("user@example.com", "correct horse battery").await;
        let token_id = token_from_query(&env.mailer.sent()[0].2);

        env.clock.advance(60 * DAYS + 1);
        assert!(matches!(
            env.service.verify_email(&token_id).await,
            Err(VerifyEmailError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn password_reset_flow() {
        let mut env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;
        env.sessions.create_session(&account.id, None).await.unwrap();

        env.service
            .request_password_reset("user@example.com", Some("ua".into()))
            .await
            .unwrap();

        let sent = env.mailer.sent();
        let reset_mail = sent.last().unwrap();
        assert_eq!(reset_mail.1, "Password reset");
        let token_id = token_from_query(&reset_mail.2);

        // Policy failures leave the token redeemable
        assert!(matches!(
            env.service.redeem_password_reset(&token_id, "short").await,
            Err(RedeemResetError::InvalidPassword)
        ));

        let account = env
            .service
            .redeem_password_reset(&token_id, "an entirely new passphrase")
            .await
            .unwrap();

        // Token consumed, sessions gone, email verified as a side effect
        assert!(matches!(
            env.service
                .redeem_password_reset(&token_id, "an entirely new passphrase")
                .await,
            Err(RedeemResetError::InvalidToken)
        ));
        assert!(env.sessions.sessions_for_account(&account.id).await.unwrap().is_empty());
        assert!(account.is_verified());
        assert!(
            env.service
                .login("user@example.com", "an entirely new passphrase")
                .await
                .is_ok()
        );

        let kinds = env.drained_kinds(&account.id).await;
        assert!(kinds.contains(&AuditEventKind::AccountResetPasswordRequested));
        assert!(kinds.contains(&AuditEventKind::AccountPasswordChanged));
        assert!(kinds.contains(&AuditEventKind::AccountEmailVerified));
    }

    #[tokio::test]
    async fn password_reset_token_expires() {
        let env = env().await;
        env.account("user@example.com", "correct horse battery").await;

        env.service
            .request_password_reset("user@example.com", None)
            .await
            .unwrap();
        let token_id = token_from_query(&env.mailer.sent().last().unwrap().2);

        env.clock.advance(16 * MINUTES);
        assert!(matches!(
            env.service
                .redeem_password_reset(&token_id, "an entirely new passphrase")
                .await,
            Err(RedeemResetError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn password_reset_reveals_unknown_email_by_design() {
        let env = env().await;
        assert!(matches!(
            env.service.request_password_reset("ghost@example.com", None).await,
            Err(LinkRequestError::AccountNotFound)
        ));
    }

    #[tokio::test]
    async fn login_link_is_single_use_and_verifies_email() {
        let env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;

        env.service
            .request_login_link("user@example.com", Some("ua".into()))
            .await
            .unwrap();

        let sent = env.mailer.sent();
        let body = &sent.last().unwrap().2;
        let token_id = body.rsplit('/').next().unwrap().to_string();

        let logged_in = env.service.redeem_login_token(&token_id).await.unwrap();
        assert_eq!(logged_in.id, account.id);
        assert!(logged_in.is_verified());

        assert!(matches!(
            env.service.redeem_login_token(&token_id).await,
            Err(LoginTokenError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn delete_account_tombstones_and_terminates() {
        let mut env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;
        env.sessions.create_session(&account.id, None).await.unwrap();

        env.clock.advance(MINUTES);
        let tombstone = env.service.delete_account(&account).await.unwrap().unwrap();

        assert_eq!(tombstone.id, account.id);
        assert_eq!(tombstone.email.as_deref(), Some("user@example.com"));
        assert_eq!(tombstone.reason.as_deref(), Some("user_deleted"));
        assert_eq!(tombstone.created, account.created);
        assert_eq!(tombstone.deleted, T0 + MINUTES);

        assert_eq!(env.count("SELECT COUNT(*) FROM accounts").await, 0);
        assert_eq!(env.count("SELECT COUNT(*) FROM tombstones").await, 1);
        assert!(env.sessions.sessions_for_account(&account.id).await.unwrap().is_empty());

        let kinds = env.drained_kinds(&account.id).await;
        assert!(kinds.contains(&AuditEventKind::AccountDeleted));
    }

    #[tokio::test]
    async fn delete_account_is_atomic_under_failure() {
        let mut env = env().await;
        let account = env.account("user@example.com", "correct horse battery").await;

        // Poison the transaction: the tombstone insert will hit a
        // primary-key conflict, so the account delete must roll back
        sqlx::query(
            "INSERT INTO tombstones (id, email, reason, created, deleted, pruned) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind("poison@example.com")
        .bind("preexisting")
        .bind(0_i64)
        .bind(0_i64)
        .bind(0_i64)
        .execute(&env.pool)
        .await
        .unwrap();

        let tombstone = env.service.delete_account(&account).await.unwrap();
        assert!(tombstone.is_none());

        // Neither side applied: the account survives and only the
        // poison tombstone row exists
        assert_eq!(env.count("SELECT COUNT(*) FROM accounts").await, 1);
        assert_eq!(env.count("SELECT COUNT(*) FROM tombstones").await, 1);

        let kinds = env.drained_kinds(&account.id).await;
        assert!(kinds.contains(&AuditEventKind::AccountDeleteFailed));
        assert!(!kinds.contains(&AuditEventKind::AccountDeleted));
    }
}
