//! Session Manager
//!
//! Cookie-bound session resolution, privilege elevation, activity
//! tracking, and one-shot flash messages.
//!
//! The manager never touches an HTTP response. Operations that change
//! cookie state return [`CookieUpdate`]s for the transport layer to
//! apply, which keeps the resolution contract testable without a server.

use std::sync::Arc;

use platform::clock::Clock;
use platform::cookie::CookieUpdate;
use platform::crypto::{constant_time_eq, generate_secure_token};

use crate::application::config::AuthConfig;
use crate::application::token_store::TokenStore;
use crate::domain::entity::account::Account;
use crate::domain::entity::token::{Flash, SessionPayload, Token, TokenKind, TokenPayload};
use crate::domain::repository::{AccountRepository, TokenRepository};
use crate::error::AuthResult;

/// Outcome of resolving a raw session cookie.
///
/// `cookie_updates` carries the clears earned by a stale cookie; the
/// transport layer must apply them even when resolution came back
/// unauthenticated.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSession {
    pub session: Option<Token>,
    pub account: Option<Account>,
    pub cookie_updates: Vec<CookieUpdate>,
}

impl ResolvedSession {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some() && self.account.is_some()
    }
}

/// Session lifecycle built on [`TokenStore`]
pub struct SessionManager<R>
where
    R: TokenRepository + AccountRepository + Clone + Send + Sync + 'static,
{
    tokens: TokenStore<R>,
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<R> SessionManager<R>
where
    R: TokenRepository + AccountRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens: TokenStore::new(repo.clone(), config.clone(), clock.clone()),
            repo,
            config,
            clock,
        }
    }

    pub fn token_store(&self) -> &TokenStore<R> {
        &self.tokens
    }

    /// Create a session and the cookie binding it
    pub async fn create_session(
        &self,
        account_id: &str,
        user_agent: Option<String>,
    ) -> AuthResult<(Token, CookieUpdate)> {
        let session = self
            .tokens
            .create_session_token(account_id, user_agent)
            .await?;

        let cookie = CookieUpdate::Set {
            config: self.config.session_cookie(),
            value: session.id.clone(),
        };

        Ok((session, cookie))
    }

    /// Resolve a raw session cookie value.
    ///
    /// Contract: missing/expired token clears the cookie and proceeds
    /// unauthenticated; a session whose owning account no longer exists
    /// is deleted as an orphan; otherwise session and account are bound
    /// together for downstream use.
    pub async fn resolve(&self, session_cookie: Option<&str>) -> AuthResult<ResolvedSession> {
        let Some(sid) = session_cookie else {
            return Ok(ResolvedSession::default());
        };

        let Some(session) = self.tokens.get(sid, TokenKind::Session).await? else {
            return Ok(ResolvedSession {
                cookie_updates: vec![self.clear_session_cookie()],
                ..Default::default()
            });
        };

        let Some(account) = self.repo.account_by_id(&session.account_id).await? else {
            // Orphaned session: the owning account is gone
            self.tokens.delete(&session.id, TokenKind::Session).await?;
            return Ok(ResolvedSession {
                cookie_updates: vec![self.clear_session_cookie()],
                ..Default::default()
            });
        };

        Ok(ResolvedSession {
            session: Some(session),
            account: Some(account),
            cookie_updates: Vec::new(),
        })
    }

    /// Delete the session and clear its cookie
    pub async fn logout(&self, session: &Token) -> AuthResult<CookieUpdate> {
        self.tokens.delete(&session.id, TokenKind::Session).await?;
        Ok(self.clear_session_cookie())
    }

    /// Delete every session the account owns
    pub async fn logout_all(&self, account_id: &str) -> AuthResult<(u64, CookieUpdate)> {
        let deleted = self.repo.delete_session_tokens_for_account(account_id).await?;
        Ok((deleted, self.clear_session_cookie()))
    }

    /// Revoke one named session, only if it belongs to the account.
    /// Returns whether it was found.
    pub async fn revoke_session(&self, account_id: &str, session_id: &str) -> AuthResult<bool> {
        let sessions = self.tokens.sessions_for_account(account_id).await?;
        if !sessions.iter().any(|s| s.id == session_id) {
            return Ok(false);
        }

        self.tokens.delete(session_id, TokenKind::Session).await?;
        Ok(true)
    }

    /// Live sessions for the account view
    pub async fn sessions_for_account(&self, account_id: &str) -> AuthResult<Vec<Token>> {
        self.tokens.sessions_for_account(account_id).await
    }

    // ------------------------------------------------------------------
    // Privilege elevation
    // ------------------------------------------------------------------

    /// Grant step-up elevation after an explicit re-authentication.
    ///
    /// The fresh token is stored in the session payload AND handed back
    /// as a strict short-lived cookie. Both channels must later agree,
    /// so leaking either one alone is not enough.
    pub async fn elevate(&self, session: &Token) -> AuthResult<CookieUpdate> {
        let elevation_token = generate_secure_token(self.config.token_id_length);
        let elevated_at = self.clock.now_ms();

        let stored = elevation_token.clone();
        self.mutate_payload(session, move |payload| {
            payload.privilege_elevation_token = Some(stored);
            payload.privilege_elevated_at = Some(elevated_at);
        })
        .await?;

        Ok(CookieUpdate::Set {
            config: self.config.elevation_cookie(),
            value: elevation_token,
        })
    }

    /// Elevation holds iff the session payload and the companion cookie
    /// carry the same token (compared constant-time) and the elevation
    /// TTL has not lapsed.
    pub fn is_elevated(&self, session: &Token, elevation_cookie: Option<&str>) -> bool {
        let Some(payload) = session.session_payload() else {
            return false;
        };
        let (Some(stored), Some(elevated_at)) = (
            payload.privilege_elevation_token.as_deref(),
            payload.privilege_elevated_at,
        ) else {
            return false;
        };
        let Some(presented) = elevation_cookie else {
            return false;
        };

        if !constant_time_eq(stored.as_bytes(), presented.as_bytes()) {
            return false;
        }

        self.clock.now_ms() - elevated_at <= self.config.elevation_ttl_ms
    }

    /// Milliseconds of elevation left, clamped at zero
    pub fn remaining_elevation(&self, session: &Token) -> i64 {
        session
            .session_payload()
            .and_then(|p| p.privilege_elevated_at)
            .map(|at| (self.config.elevation_ttl_ms - (self.clock.now_ms() - at)).max(0))
            .unwrap_or(0)
    }

    /// Drop the elevation state from the session and clear its cookie
    pub async fn clear_elevation(&self, session: &Token) -> AuthResult<CookieUpdate> {
        self.mutate_payload(session, |payload| {
            payload.privilege_elevation_token = None;
            payload.privilege_elevated_at = None;
        })
        .await?;

        Ok(CookieUpdate::Clear {
            config: self.config.elevation_cookie(),
        })
    }

    // ------------------------------------------------------------------
    // Activity tracking
    // ------------------------------------------------------------------

    /// Record request activity.
    ///
    /// If the prior activity is older than the inactivity threshold it
    /// becomes the previous-visit snapshot, which is what separates
    /// "this request" from "the last distinct visit".
    pub async fn touch_activity(&self, session: &Token) -> AuthResult<()> {
        let now = self.clock.now_ms();
        let inactivity_refresh_ms = self.config.inactivity_refresh_ms;

        self.mutate_payload(session, move |payload| {
            let last_activity = payload.last_activity.unwrap_or(0);
            if last_activity > 0 && last_activity < now - inactivity_refresh_ms {
                payload.previous_visit = Some(last_activity);
            }
            payload.last_activity = Some(now);
        })
        .await
    }

    // ------------------------------------------------------------------
    // Flash messages
    // ------------------------------------------------------------------

    /// Attach a one-shot notification, persisted immediately
    pub async fn set_flash(&self, session: &Token, flash: Flash) -> AuthResult<()> {
        self.mutate_payload(session, move |payload| {
            payload.flash = Some(flash);
        })
        .await
    }

    /// Read and delete the flash in one operation (read-once)
    pub async fn consume_flash(&self, session: &Token) -> AuthResult<Option<Flash>> {
        // Re-fetch so we take the freshest payload, not the one captured
        // at resolution time
        let Some(current) = self.tokens.get(&session.id, TokenKind::Session).await? else {
            return Ok(None);
        };

        let mut payload = current.session_payload_or_default();
        let flash = payload.flash.take();

        if flash.is_some() {
            self.tokens
                .update_payload(
                    &session.id,
                    TokenKind::Session,
                    &TokenPayload::Session(payload),
                )
                .await?;
        }

        Ok(flash)
    }

    fn clear_session_cookie(&self) -> CookieUpdate {
        CookieUpdate::Clear {
            config: self.config.session_cookie(),
        }
    }

    /// Value-style payload mutation: re-read the stored payload, clone,
    /// apply exactly one change, persist the whole new value.
    ///
    /// Applying against the freshest stored state keeps independent
    /// concerns (activity, elevation, flash) from clobbering each other
    /// when they touch the same session in one request. A session that
    /// disappeared in the meantime makes this a no-op.
    async fn mutate_payload<F>(&self, session: &Token, apply: F) -> AuthResult<()>
    where
        F: FnOnce(&mut SessionPayload),
    {
        let Some(current) = self.tokens.get(&session.id, TokenKind::Session).await? else {
            return Ok(());
        };

        let mut payload = current.session_payload_or_default();
        apply(&mut payload);

        self.tokens
            .update_payload(
                &session.id,
                TokenKind::Session,
                &TokenPayload::Session(payload),
            )
            .await?;

        Ok(())
    }
}
