//! Auth Router

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};

use audit::AuditTrail;
use platform::clock::Clock;
use platform::password::BreachListLookup;

use crate::application::account_service::AccountService;
use crate::application::config::AuthConfig;
use crate::application::session::SessionManager;
use crate::domain::repository::{AccountRepository, TokenRepository};
use crate::infra::mailer::{LogMailer, Mailer};
use crate::infra::sqlite::SqliteStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::session_middleware;

/// Create the auth router for the SQLite repository with the log mailer
pub fn auth_router(
    repo: SqliteStore,
    audit: AuditTrail,
    config: AuthConfig,
    clock: Arc<dyn Clock>,
) -> Router {
    auth_router_generic(repo, LogMailer, audit, config, clock)
}

/// Create the auth router for any repository / mailer implementation
pub fn auth_router_generic<R, M>(
    repo: R,
    mailer: M,
    audit: AuditTrail,
    config: AuthConfig,
    clock: Arc<dyn Clock>,
) -> Router
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let repo = Arc::new(repo);
    let config = Arc::new(config);

    let state = AuthAppState {
        sessions: Arc::new(SessionManager::new(
            repo.clone(),
            config.clone(),
            clock.clone(),
        )),
        service: Arc::new(AccountService::new(
            repo,
            audit.clone(),
            Arc::new(mailer),
            config.clone(),
            clock,
        )),
        audit,
        config,
    };

    Router::new()
        .route("/signup", post(handlers::signup::<R, M>))
        .route("/login", post(handlers::login::<R, M>))
        .route("/login/token", post(handlers::login_with_token::<R, M>))
        .route("/login-link", post(handlers::request_login_link::<R, M>))
        .route("/reset-password", post(handlers::request_password_reset::<R, M>))
        .route("/set-password", post(handlers::set_password::<R, M>))
        .route("/verify-email", post(handlers::verify_email::<R, M>))
        .route("/me", get(handlers::me::<R, M>))
        .route("/logout", post(handlers::logout::<R, M>))
        .route("/logout/all", post(handlers::logout_all::<R, M>))
        .route(
            "/sessions/{session_id}/revoke",
            post(handlers::revoke_session::<R, M>),
        )
        .route("/elevate", post(handlers::elevate::<R, M>))
        .route("/password", post(handlers::change_password::<R, M>))
        .route("/email", post(handlers::change_email::<R, M>))
        .route("/account", delete(handlers::delete_account::<R, M>))
        .route(
            "/verification/request",
            post(handlers::request_verification::<R, M>),
        )
        .route("/cron/sweep-tokens", post(handlers::sweep_tokens::<R, M>))
        .layer(from_fn_with_state(state.clone(), session_middleware::<R, M>))
        .with_state(state)
}
