//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::domain::entity::account::Account;
use crate::domain::entity::token::{Flash, FlashKind, Token};

// ============================================================================
// Requests
// ============================================================================

/// Sign up request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    /// Optional: without it the account starts on a throwaway credential
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token redemption request (login link, email verification)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub token: String,
}

/// Privilege elevation request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevateRequest {
    pub current_password: String,
}

/// Change password request (elevated)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub password: String,
}

/// Change email request (elevated)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEmailRequest {
    pub email: String,
}

/// Delete account request (elevated)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountRequest {
    /// Must be the literal word DELETE
    pub confirm: String,
}

/// Email-link request (password reset, login link)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub email: String,
}

/// Password reset redemption request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPasswordRequest {
    pub token: String,
    pub password: String,
}

// ============================================================================
// Responses
// ============================================================================

/// Public account view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub email_verified: bool,
    pub role: String,
    pub created: i64,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            email_verified: account.is_verified(),
            role: account.role.code().to_string(),
            created: account.created,
        }
    }
}

/// Session summary for the account view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub created: i64,
    pub expires: i64,
    pub user_agent: Option<String>,
    pub last_activity: Option<i64>,
    pub previous_visit: Option<i64>,
    pub is_current: bool,
}

impl SessionResponse {
    pub fn from_token(token: &Token, current_id: &str) -> Self {
        let payload = token.session_payload();
        Self {
            id: token.id.clone(),
            created: token.created,
            expires: token.expires,
            user_agent: payload.and_then(|p| p.user_agent.clone()),
            last_activity: payload.and_then(|p| p.last_activity),
            previous_visit: payload.and_then(|p| p.previous_visit),
            is_current: token.id == current_id,
        }
    }
}

/// One-shot flash message
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashResponse {
    pub kind: &'static str,
    pub message: String,
}

impl From<Flash> for FlashResponse {
    fn from(flash: Flash) -> Self {
        let kind = match flash.kind {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
            FlashKind::Info => "info",
        };
        Self {
            kind,
            message: flash.message,
        }
    }
}

/// GET /me response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub account: AccountResponse,
    pub active_sessions: Vec<SessionResponse>,
    pub flash: Option<FlashResponse>,
    /// Milliseconds of privilege elevation left, 0 when not elevated
    pub elevation_remaining_ms: i64,
}

/// Generic message response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Cron sweep response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResponse {
    pub deleted: u64,
}
