//! Session Middleware
//!
//! Resolves the session cookie per request, binds the outcome into
//! request extensions, and applies the resolution's cookie mutations to
//! the response.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::Response;

use platform::password::BreachListLookup;

use crate::application::session::ResolvedSession;
use crate::domain::entity::account::Account;
use crate::domain::entity::token::Token;
use crate::domain::repository::{AccountRepository, TokenRepository};
use crate::error::AuthError;
use crate::infra::mailer::Mailer;
use crate::presentation::handlers::AuthAppState;

/// Resolved request identity, stored in request extensions
#[derive(Debug, Clone, Default)]
pub struct CurrentSession {
    pub session: Option<Token>,
    pub account: Option<Account>,
}

impl CurrentSession {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some() && self.account.is_some()
    }

    /// Session and account together, or a 401-mapped error
    pub fn require_account(&self) -> Result<(&Token, &Account), AuthError> {
        match (&self.session, &self.account) {
            (Some(session), Some(account)) => Ok((session, account)),
            _ => Err(AuthError::SessionInvalid),
        }
    }
}

/// Middleware resolving the session cookie on every request.
///
/// Resolution never fails the request: a storage error logs and proceeds
/// unauthenticated, matching the rule that no failure may crash the
/// process.
pub async fn session_middleware<R, M>(
    State(state): State<AuthAppState<R, M>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let sid = platform::cookie::extract_cookie(req.headers(), &state.config.session_cookie_name);

    let resolved = match state.sessions.resolve(sid.as_deref()).await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!(error = %e, "session resolution failed");
            ResolvedSession::default()
        }
    };

    req.extensions_mut().insert(CurrentSession {
        session: resolved.session,
        account: resolved.account,
    });

    let mut response = next.run(req).await;

    for update in &resolved.cookie_updates {
        response
            .headers_mut()
            .append(header::SET_COOKIE, update.to_header_value());
    }

    response
}
