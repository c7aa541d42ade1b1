//! Account Entity

use std::fmt;

use serde::{Deserialize, Serialize};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    #[default]
    User,
    Admin,
}

impl AccountRole {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            AccountRole::User => "user",
            AccountRole::Admin => "admin",
        }
    }

    /// Map a stored role back; unknown values degrade to `User`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "user" => AccountRole::User,
            "admin" => AccountRole::Admin,
            _ => {
                tracing::error!(role = %code, "unknown account role in storage");
                AccountRole::User
            }
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, AccountRole::Admin)
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Account entity
///
/// `password` holds the PHC hash string, never clear text.
/// `email_verified` is 0 until verified, then the verification timestamp;
/// it returns to 0 only when the email address changes.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub created: i64,
    /// 0 until the first update
    pub updated: i64,
    pub email: String,
    pub password: String,
    pub email_verified: i64,
    pub role: AccountRole,
}

impl Account {
    pub fn new(id: String, email: impl Into<String>, password_hash: String, now_ms: i64) -> Self {
        Self {
            id,
            created: now_ms,
            updated: 0,
            email: email.into(),
            password: password_hash,
            email_verified: 0,
            role: AccountRole::default(),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.email_verified > 0
    }

    /// Mark the email verified; a no-op if it already is.
    pub fn mark_verified(&mut self, now_ms: i64) {
        if !self.is_verified() {
            self.email_verified = now_ms;
        }
    }

    /// Change the address; verification state resets with it.
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.email_verified = 0;
    }
}

/// Basic email format validation: one `@`, non-empty local part, domain
/// with a dot, no whitespace anywhere.
pub fn is_valid_email(s: &str) -> bool {
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    // Domain needs a dot with something on both sides
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("User@Example.COM"));
        assert!(is_valid_email("user.name+tag@example.co.jp"));
    }

    #[test]
    fn test_email_invalid() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("user name@example.com"));
    }

    #[test]
    fn test_role_codes() {
        assert_eq!(AccountRole::from_code("admin"), AccountRole::Admin);
        assert_eq!(AccountRole::from_code("user"), AccountRole::User);
        assert_eq!(AccountRole::from_code("wizard"), AccountRole::User);
        assert!(AccountRole::Admin.is_admin());
        assert!(!AccountRole::User.is_admin());
    }

    #[test]
    fn test_verification_transitions() {
        let mut account = Account::new("id1".into(), "a@b.com", "hash".into(), 1_000);
        assert!(!account.is_verified());

        account.mark_verified(2_000);
        assert_eq!(account.email_verified, 2_000);

        // Second verification event must not move the timestamp
        account.mark_verified(3_000);
        assert_eq!(account.email_verified, 2_000);

        // Email change resets verification
        account.set_email("c@d.com");
        assert!(!account.is_verified());
    }
}
