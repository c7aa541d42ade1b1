//! HTTP Handlers
//!
//! Thin JSON layer over the application services. Flow errors map to a
//! discriminated `{ error, message }` body; cookie mutations returned by
//! the session manager are applied here.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use audit::{AuditEventKind, AuditLevel, AuditTrail};
use platform::cookie::CookieUpdate;
use platform::crypto::constant_time_eq;
use platform::password::BreachListLookup;

use crate::application::account_service::{
    AccountService, ChangeEmailError, LinkRequestError, LoginError, LoginTokenError,
    RedeemResetError, SetPasswordError, SignupError, VerifyEmailError,
};
use crate::application::config::AuthConfig;
use crate::application::session::SessionManager;
use crate::domain::entity::token::{Flash, FlashKind};
use crate::domain::repository::{AccountRepository, TokenRepository};
use crate::error::AuthError;
use crate::infra::mailer::Mailer;
use crate::presentation::dto::{
    AccountResponse, ChangeEmailRequest, ChangePasswordRequest, DeleteAccountRequest,
    ElevateRequest, EmailRequest, LoginRequest, MeResponse, MessageResponse, SessionResponse,
    SetPasswordRequest, SignupRequest, SweepResponse, TokenRequest,
};
use crate::presentation::middleware::CurrentSession;

/// Shared state for auth handlers
pub struct AuthAppState<R, M>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    pub sessions: Arc<SessionManager<R>>,
    pub service: Arc<AccountService<R, M>>,
    pub audit: AuditTrail,
    pub config: Arc<AuthConfig>,
}

impl<R, M> Clone for AuthAppState<R, M>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            service: self.service.clone(),
            audit: self.audit.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Flow error -> HTTP mapping
// ============================================================================

fn flow_error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

impl IntoResponse for SignupError {
    fn into_response(self) -> Response {
        use SignupError::*;
        match &self {
            InvalidEmail => flow_error(StatusCode::BAD_REQUEST, "invalid_email", &self.to_string()),
            InvalidPassword => {
                flow_error(StatusCode::BAD_REQUEST, "invalid_password", &self.to_string())
            }
            TrivialPassword => {
                flow_error(StatusCode::BAD_REQUEST, "trivial_password", &self.to_string())
            }
            EmailExists => flow_error(StatusCode::CONFLICT, "email_exists", &self.to_string()),
            ErrorCreatingAccount(detail) => {
                tracing::error!(detail = %detail, "account creation failed");
                flow_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "error_creating_account",
                    "Failed to create account. Please try again or contact support.",
                )
            }
        }
    }
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        use LoginError::*;
        match self {
            InvalidEmail => flow_error(
                StatusCode::BAD_REQUEST,
                "invalid_email",
                "Please provide a valid email address",
            ),
            AccountNotFound => flow_error(
                StatusCode::NOT_FOUND,
                "account_not_found",
                "There is no account with this email address",
            ),
            InvalidPassword => {
                flow_error(StatusCode::UNAUTHORIZED, "invalid_password", "Wrong password")
            }
            Unavailable(e) => e.into_response(),
        }
    }
}

impl IntoResponse for SetPasswordError {
    fn into_response(self) -> Response {
        use SetPasswordError::*;
        match self {
            InvalidPassword => flow_error(
                StatusCode::BAD_REQUEST,
                "invalid_password",
                "Password must have at least 8 characters",
            ),
            TrivialPassword => flow_error(
                StatusCode::BAD_REQUEST,
                "trivial_password",
                "The chosen password is too common, please choose a stronger password",
            ),
            Unavailable(e) => e.into_response(),
        }
    }
}

impl IntoResponse for ChangeEmailError {
    fn into_response(self) -> Response {
        use ChangeEmailError::*;
        match &self {
            InvalidEmail => flow_error(StatusCode::BAD_REQUEST, "invalid_email", &self.to_string()),
            EmailInUse => flow_error(StatusCode::CONFLICT, "email_in_use", &self.to_string()),
            AccountNotFound => {
                flow_error(StatusCode::NOT_FOUND, "account_not_found", &self.to_string())
            }
            UpdateFailed => flow_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "update_failed",
                "Failed to update account. Please try again or contact support.",
            ),
        }
    }
}

impl IntoResponse for LinkRequestError {
    fn into_response(self) -> Response {
        use LinkRequestError::*;
        match self {
            InvalidEmail => flow_error(
                StatusCode::BAD_REQUEST,
                "invalid_email",
                "Please provide a valid email address",
            ),
            AccountNotFound => flow_error(
                StatusCode::NOT_FOUND,
                "account_not_found",
                "There is no account with this email address",
            ),
            Unavailable(e) => e.into_response(),
        }
    }
}

impl IntoResponse for RedeemResetError {
    fn into_response(self) -> Response {
        use RedeemResetError::*;
        match self {
            InvalidToken => flow_error(
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Password reset token not found or expired",
            ),
            AccountNotFound => {
                flow_error(StatusCode::NOT_FOUND, "account_not_found", "Account not found")
            }
            InvalidPassword => flow_error(
                StatusCode::BAD_REQUEST,
                "invalid_password",
                "Password must have at least 8 characters",
            ),
            TrivialPassword => flow_error(
                StatusCode::BAD_REQUEST,
                "trivial_password",
                "The chosen password is too common, please choose a stronger password",
            ),
            Unavailable(e) => e.into_response(),
        }
    }
}

impl IntoResponse for LoginTokenError {
    fn into_response(self) -> Response {
        use LoginTokenError::*;
        match self {
            InvalidToken => flow_error(
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Login link not found or expired",
            ),
            AccountNotFound => {
                flow_error(StatusCode::NOT_FOUND, "account_not_found", "Account not found")
            }
            Unavailable(e) => e.into_response(),
        }
    }
}

impl IntoResponse for VerifyEmailError {
    fn into_response(self) -> Response {
        use VerifyEmailError::*;
        match self {
            InvalidToken => flow_error(
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Email verification token not found or expired",
            ),
            AccountNotFound => {
                flow_error(StatusCode::NOT_FOUND, "account_not_found", "Account not found")
            }
            Unavailable(e) => e.into_response(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn apply_cookies(response: impl IntoResponse, updates: &[CookieUpdate]) -> Response {
    let mut response = response.into_response();
    for update in updates {
        response
            .headers_mut()
            .append(header::SET_COOKIE, update.to_header_value());
    }
    response
}

fn elevation_cookie_value(headers: &HeaderMap, config: &AuthConfig) -> Option<String> {
    platform::cookie::extract_cookie(headers, &config.elevation_cookie_name)
}

// ============================================================================
// Visitor flows
// ============================================================================

/// POST /signup
pub async fn signup<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    Json(req): Json<SignupRequest>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let account = state
        .service
        .signup(&req.email, req.password.as_deref())
        .await
        .map_err(IntoResponse::into_response)?;

    // The user just proved control of their credentials, so the fresh
    // session starts elevated
    let (session, session_cookie) = state
        .sessions
        .create_session(&account.id, user_agent(&headers))
        .await
        .map_err(IntoResponse::into_response)?;
    let elevation_cookie = state
        .sessions
        .elevate(&session)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(apply_cookies(
        (StatusCode::CREATED, Json(AccountResponse::from(&account))),
        &[session_cookie, elevation_cookie],
    ))
}

/// POST /login
pub async fn login<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let account = state
        .service
        .login(req.email.trim(), req.password.trim())
        .await
        .map_err(IntoResponse::into_response)?;

    let (session, session_cookie) = state
        .sessions
        .create_session(&account.id, user_agent(&headers))
        .await
        .map_err(IntoResponse::into_response)?;
    let elevation_cookie = state
        .sessions
        .elevate(&session)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(apply_cookies(
        Json(AccountResponse::from(&account)),
        &[session_cookie, elevation_cookie],
    ))
}

/// POST /login/token - redeem a single-use login link
pub async fn login_with_token<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    Json(req): Json<TokenRequest>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let account = state
        .service
        .redeem_login_token(req.token.trim())
        .await
        .map_err(IntoResponse::into_response)?;

    let (session, session_cookie) = state
        .sessions
        .create_session(&account.id, user_agent(&headers))
        .await
        .map_err(IntoResponse::into_response)?;
    let elevation_cookie = state
        .sessions
        .elevate(&session)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(apply_cookies(
        Json(AccountResponse::from(&account)),
        &[session_cookie, elevation_cookie],
    ))
}

/// POST /login-link - request a single-use login link by email
pub async fn request_login_link<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    Json(req): Json<EmailRequest>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    state
        .service
        .request_login_link(&req.email, user_agent(&headers))
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(MessageResponse::new("We've sent you a login link.")).into_response())
}

/// POST /reset-password - request a password reset link
pub async fn request_password_reset<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    Json(req): Json<EmailRequest>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    state
        .service
        .request_password_reset(&req.email, user_agent(&headers))
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(MessageResponse::new(
        "We've sent you an email with a link to reset your password.",
    ))
    .into_response())
}

/// POST /set-password - redeem a reset token and log in directly
pub async fn set_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    Json(req): Json<SetPasswordRequest>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let account = state
        .service
        .redeem_password_reset(req.token.trim(), req.password.trim())
        .await
        .map_err(IntoResponse::into_response)?;

    let (session, session_cookie) = state
        .sessions
        .create_session(&account.id, user_agent(&headers))
        .await
        .map_err(IntoResponse::into_response)?;
    let elevation_cookie = state
        .sessions
        .elevate(&session)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(apply_cookies(
        Json(AccountResponse::from(&account)),
        &[session_cookie, elevation_cookie],
    ))
}

/// POST /verify-email - redeem an email verification token
pub async fn verify_email<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<TokenRequest>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    state
        .service
        .verify_email(req.token.trim())
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(MessageResponse::new("Email verified, thank you!")).into_response())
}

// ============================================================================
// Account flows (authenticated)
// ============================================================================

/// GET /me - account view with sessions, flash, and elevation state
pub async fn me<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let (session, account) = current
        .require_account()
        .map_err(IntoResponse::into_response)?;

    state
        .sessions
        .touch_activity(session)
        .await
        .map_err(IntoResponse::into_response)?;

    let flash = state
        .sessions
        .consume_flash(session)
        .await
        .map_err(IntoResponse::into_response)?;

    let active_sessions = state
        .sessions
        .sessions_for_account(&account.id)
        .await
        .map_err(IntoResponse::into_response)?
        .iter()
        .map(|t| SessionResponse::from_token(t, &session.id))
        .collect();

    Ok(Json(MeResponse {
        account: AccountResponse::from(account),
        active_sessions,
        flash: flash.map(Into::into),
        elevation_remaining_ms: state.sessions.remaining_elevation(session),
    })
    .into_response())
}

/// POST /logout
pub async fn logout<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let (session, _) = current
        .require_account()
        .map_err(IntoResponse::into_response)?;

    let cookie = state
        .sessions
        .logout(session)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(apply_cookies(StatusCode::NO_CONTENT, &[cookie]))
}

/// POST /logout/all
pub async fn logout_all<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let (_, account) = current
        .require_account()
        .map_err(IntoResponse::into_response)?;

    let (deleted, cookie) = state
        .sessions
        .logout_all(&account.id)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(apply_cookies(Json(SweepResponse { deleted }), &[cookie]))
}

/// POST /sessions/{session_id}/revoke
pub async fn revoke_session<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(current): Extension<CurrentSession>,
    Path(session_id): Path<String>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let (session, account) = current
        .require_account()
        .map_err(IntoResponse::into_response)?;

    let revoked = state
        .sessions
        .revoke_session(&account.id, &session_id)
        .await
        .map_err(IntoResponse::into_response)?;

    if !revoked {
        return Err(flow_error(
            StatusCode::NOT_FOUND,
            "session_not_found",
            "Session not found or does not belong to your account.",
        ));
    }

    let mut cookies = Vec::new();
    if session.id == session_id {
        cookies.push(CookieUpdate::Clear {
            config: state.config.session_cookie(),
        });
    }

    Ok(apply_cookies(StatusCode::NO_CONTENT, &cookies))
}

/// POST /elevate - step-up re-authentication with the current password
pub async fn elevate<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(current): Extension<CurrentSession>,
    Json(req): Json<ElevateRequest>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let (session, account) = current
        .require_account()
        .map_err(IntoResponse::into_response)?;

    if !state
        .service
        .directory()
        .verify_password(account, req.current_password.trim())
    {
        state.service.record_invalid_password(&account.id);
        return Err(flow_error(
            StatusCode::UNAUTHORIZED,
            "invalid_password",
            "Password is incorrect",
        ));
    }

    let cookie = state
        .sessions
        .elevate(session)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(apply_cookies(
        Json(MessageResponse::new("Privilege elevated")),
        &[cookie],
    ))
}

/// POST /password - change the password (requires elevation)
pub async fn change_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(current): Extension<CurrentSession>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let (session, account) = current
        .require_account()
        .map_err(IntoResponse::into_response)?;

    let elevation = elevation_cookie_value(&headers, &state.config);
    if !state.sessions.is_elevated(session, elevation.as_deref()) {
        return Err(AuthError::ElevationRequired.into_response());
    }

    let account = state
        .service
        .set_password(account, req.password.trim())
        .await
        .map_err(IntoResponse::into_response)?;

    // Every session is gone now, including this one; issue a fresh
    // session and elevation since the user just proved their identity
    let (new_session, session_cookie) = state
        .sessions
        .create_session(&account.id, user_agent(&headers))
        .await
        .map_err(IntoResponse::into_response)?;
    let elevation_cookie = state
        .sessions
        .elevate(&new_session)
        .await
        .map_err(IntoResponse::into_response)?;

    state
        .sessions
        .set_flash(
            &new_session,
            Flash {
                kind: FlashKind::Success,
                message: "Your password has been changed".to_string(),
            },
        )
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(apply_cookies(
        Json(AccountResponse::from(&account)),
        &[session_cookie, elevation_cookie],
    ))
}

/// POST /email - change the email address (requires elevation)
pub async fn change_email<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(current): Extension<CurrentSession>,
    headers: HeaderMap,
    Json(req): Json<ChangeEmailRequest>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let (session, account) = current
        .require_account()
        .map_err(IntoResponse::into_response)?;

    let elevation = elevation_cookie_value(&headers, &state.config);
    if !state.sessions.is_elevated(session, elevation.as_deref()) {
        return Err(AuthError::ElevationRequired.into_response());
    }

    state
        .service
        .change_email(&account.id, &req.email)
        .await
        .map_err(IntoResponse::into_response)?;

    state
        .sessions
        .set_flash(
            session,
            Flash {
                kind: FlashKind::Success,
                message: "Your email address has been changed".to_string(),
            },
        )
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(MessageResponse::new("Your email address has been changed")).into_response())
}

/// DELETE /account - delete behind a tombstone (requires elevation)
pub async fn delete_account<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(current): Extension<CurrentSession>,
    headers: HeaderMap,
    Json(req): Json<DeleteAccountRequest>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let (session, account) = current
        .require_account()
        .map_err(IntoResponse::into_response)?;

    let elevation = elevation_cookie_value(&headers, &state.config);
    if !state.sessions.is_elevated(session, elevation.as_deref()) {
        return Err(AuthError::ElevationRequired.into_response());
    }

    if !req.confirm.trim().eq_ignore_ascii_case("DELETE") {
        return Err(flow_error(
            StatusCode::BAD_REQUEST,
            "confirmation_required",
            "Please type DELETE to confirm.",
        ));
    }

    let tombstone = state
        .service
        .delete_account(account)
        .await
        .map_err(IntoResponse::into_response)?;

    if tombstone.is_none() {
        return Err(flow_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "delete_failed",
            "Failed to delete account. Please try again or contact support.",
        ));
    }

    let cookies = [
        CookieUpdate::Clear {
            config: state.config.session_cookie(),
        },
        CookieUpdate::Clear {
            config: state.config.elevation_cookie(),
        },
    ];

    Ok(apply_cookies(
        Json(MessageResponse::new("Your account has been deleted.")),
        &cookies,
    ))
}

/// POST /verification/request - re-send the verification email
pub async fn request_verification<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    let (session, account) = current
        .require_account()
        .map_err(IntoResponse::into_response)?;

    state
        .service
        .request_verification_email(&account.id)
        .await
        .map_err(IntoResponse::into_response)?;

    state
        .sessions
        .set_flash(
            session,
            Flash {
                kind: FlashKind::Info,
                message: "Verification email sent. Please also check your spam folder."
                    .to_string(),
            },
        )
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(MessageResponse::new("Verification email sent.")).into_response())
}

// ============================================================================
// Cron
// ============================================================================

/// POST /cron/sweep-tokens - remove expired tokens (bearer-guarded)
pub async fn sweep_tokens<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
) -> Result<Response, Response>
where
    R: TokenRepository + AccountRepository + BreachListLookup + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static,
{
    require_cron_bearer(&headers, &state.config)?;

    let deleted = state
        .sessions
        .token_store()
        .sweep_expired()
        .await
        .map_err(IntoResponse::into_response)?;

    state.audit.record(
        AuditEventKind::CronCleanupCompleted,
        None,
        AuditLevel::Info,
        json!({ "message": format!("Deleted {deleted} expired tokens") }),
    );

    Ok(Json(SweepResponse { deleted }).into_response())
}

fn require_cron_bearer(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Response> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    // An unconfigured token disables the endpoint outright
    let authorized = match presented {
        Some(token) if !config.cron_api_token.is_empty() => {
            constant_time_eq(token.as_bytes(), config.cron_api_token.as_bytes())
        }
        _ => false,
    };

    if authorized {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED.into_response())
    }
}
