//! Audit Event Model

use std::fmt;

use serde_json::Value as JsonValue;

/// Closed set of recorded event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditEventKind {
    // Security-relevant
    AccountResetPasswordRequested,
    AccountPasswordChanged,
    AccountEmailChanged,
    AccountEmailVerified,
    AccountInvalidPassword,

    // Account lifecycle
    AccountCreated,
    AccountCreateFailed,
    AccountDeleted,
    AccountDeleteFailed,

    // System (no account)
    CronCleanupCompleted,
    SystemError,
}

impl AuditEventKind {
    pub const fn code(&self) -> &'static str {
        use AuditEventKind::*;
        match self {
            AccountResetPasswordRequested => "account_reset_password_requested",
            AccountPasswordChanged => "account_password_changed",
            AccountEmailChanged => "account_email_changed",
            AccountEmailVerified => "account_email_verified",
            AccountInvalidPassword => "account_invalid_password",
            AccountCreated => "account_created",
            AccountCreateFailed => "account_create_failed",
            AccountDeleted => "account_deleted",
            AccountDeleteFailed => "account_delete_failed",
            CronCleanupCompleted => "cron_cleanup_completed",
            SystemError => "system_error",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        use AuditEventKind::*;
        match code {
            "account_reset_password_requested" => Some(AccountResetPasswordRequested),
            "account_password_changed" => Some(AccountPasswordChanged),
            "account_email_changed" => Some(AccountEmailChanged),
            "account_email_verified" => Some(AccountEmailVerified),
            "account_invalid_password" => Some(AccountInvalidPassword),
            "account_created" => Some(AccountCreated),
            "account_create_failed" => Some(AccountCreateFailed),
            "account_deleted" => Some(AccountDeleted),
            "account_delete_failed" => Some(AccountDeleteFailed),
            "cron_cleanup_completed" => Some(CronCleanupCompleted),
            "system_error" => Some(SystemError),
            _ => None,
        }
    }
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Severity level, stored as an integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i64)]
pub enum AuditLevel {
    Ok = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Critical = 4,
}

impl AuditLevel {
    #[inline]
    pub const fn id(&self) -> i64 {
        *self as i64
    }

    #[inline]
    pub const fn label(&self) -> &'static str {
        use AuditLevel::*;
        match self {
            Ok => "ok",
            Info => "info",
            Warn => "warn",
            Error => "error",
            Critical => "critical",
        }
    }

    /// Map a stored level back; unknown values degrade to `Info`.
    pub fn from_id(id: i64) -> Self {
        use AuditLevel::*;
        match id {
            0 => Ok,
            1 => Info,
            2 => Warn,
            3 => Error,
            4 => Critical,
            _ => {
                tracing::debug!(level = id, "unknown audit level in storage");
                Info
            }
        }
    }
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One recorded event
///
/// `data` is an open JSON object; a `message` field is conventional for
/// the human-readable summary, the rest is free-form.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Assigned by storage; `None` until persisted
    pub id: Option<i64>,
    /// Owning account, or `None` for system events
    pub account_id: Option<String>,
    pub kind: AuditEventKind,
    pub level: AuditLevel,
    pub data: JsonValue,
    pub created: i64,
}
