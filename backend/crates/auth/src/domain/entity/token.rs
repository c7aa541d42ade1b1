//! Token Entity
//!
//! One storage shape multiplexes four token kinds. The payload is a
//! closed tagged enum at the API boundary; storage underneath keeps a
//! single opaque string column. Marshalling is strict on write and
//! tolerant on read: corrupt stored payloads surface as `None`, never as
//! errors, so a damaged row can never take down a request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Token kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Session,
    VerifyEmail,
    PasswordReset,
    Login,
}

impl TokenKind {
    pub const fn code(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Session => "session",
            VerifyEmail => "verify_email",
            PasswordReset => "password_reset",
            Login => "login",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        use TokenKind::*;
        match code {
            "session" => Some(Session),
            "verify_email" => Some(VerifyEmail),
            "password_reset" => Some(PasswordReset),
            "login" => Some(Login),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Flash message category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

/// One-shot notification attached to a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// Session token payload
///
/// Mutated by several independent concerns (activity tracking, privilege
/// elevation, flash); treat it as a value: clone, change, persist whole.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// UNIX ms of the most recent request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<i64>,
    /// UNIX ms of the previous distinct visit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_visit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privilege_elevation_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privilege_elevated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flash: Option<Flash>,
}

/// Email verification token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyEmailPayload {
    /// Address the token was issued for
    pub email: String,
}

/// Password reset token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetPayload {
    /// Address to treat as verified when the reset is redeemed
    pub verify_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Single-use login link payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPayload {
    pub verify_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Closed payload union, tagged by the owning token's kind
#[derive(Debug, Clone, PartialEq)]
pub enum TokenPayload {
    Session(SessionPayload),
    VerifyEmail(VerifyEmailPayload),
    PasswordReset(PasswordResetPayload),
    Login(LoginPayload),
}

impl TokenPayload {
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenPayload::Session(_) => TokenKind::Session,
            TokenPayload::VerifyEmail(_) => TokenKind::VerifyEmail,
            TokenPayload::PasswordReset(_) => TokenKind::PasswordReset,
            TokenPayload::Login(_) => TokenKind::Login,
        }
    }

    /// Strict write: a serialization failure degrades to the empty string
    /// (read back as no payload) rather than failing the operation.
    pub fn marshal(payload: Option<&TokenPayload>) -> String {
        let Some(payload) = payload else {
            return String::new();
        };

        let result = match payload {
            TokenPayload::Session(p) => serde_json::to_string(p),
            TokenPayload::VerifyEmail(p) => serde_json::to_string(p),
            TokenPayload::PasswordReset(p) => serde_json::to_string(p),
            TokenPayload::Login(p) => serde_json::to_string(p),
        };

        result.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "failed to marshal token payload");
            String::new()
        })
    }

    /// Tolerant read: empty or corrupt input is `None`.
    pub fn unmarshal(kind: TokenKind, raw: &str) -> Option<TokenPayload> {
        if raw.is_empty() {
            return None;
        }

        let result = match kind {
            TokenKind::Session => serde_json::from_str(raw).map(TokenPayload::Session),
            TokenKind::VerifyEmail => serde_json::from_str(raw).map(TokenPayload::VerifyEmail),
            TokenKind::PasswordReset => serde_json::from_str(raw).map(TokenPayload::PasswordReset),
            TokenKind::Login => serde_json::from_str(raw).map(TokenPayload::Login),
        };

        match result {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::debug!(kind = %kind, error = %e, "failed to unmarshal token payload");
                None
            }
        }
    }
}

/// Token entity
#[derive(Debug, Clone)]
pub struct Token {
    /// Opaque id from the 64-symbol alphabet
    pub id: String,
    pub created: i64,
    pub expires: i64,
    pub account_id: String,
    pub kind: TokenKind,
    pub payload: Option<TokenPayload>,
}

impl Token {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires <= now_ms
    }

    pub fn session_payload(&self) -> Option<&SessionPayload> {
        match &self.payload {
            Some(TokenPayload::Session(p)) => Some(p),
            _ => None,
        }
    }

    /// Clone of the session payload, or a fresh one for payload-less rows
    pub fn session_payload_or_default(&self) -> SessionPayload {
        self.session_payload().cloned().unwrap_or_default()
    }

    pub fn verify_email_payload(&self) -> Option<&VerifyEmailPayload> {
        match &self.payload {
            Some(TokenPayload::VerifyEmail(p)) => Some(p),
            _ => None,
        }
    }

    pub fn password_reset_payload(&self) -> Option<&PasswordResetPayload> {
        match &self.payload {
            Some(TokenPayload::PasswordReset(p)) => Some(p),
            _ => None,
        }
    }

    pub fn login_payload(&self) -> Option<&LoginPayload> {
        match &self.payload {
            Some(TokenPayload::Login(p)) => Some(p),
            _ => None,
        }
    }
}
