//! Tombstone Entity
//!
//! Permanent record that an account once existed, retained after the
//! account row itself is removed.

use crate::domain::entity::account::Account;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tombstone {
    /// Same id the account carried
    pub id: String,
    pub email: Option<String>,
    pub reason: Option<String>,
    /// When the account was created
    pub created: i64,
    /// When the account was deleted
    pub deleted: i64,
    /// When remaining data was pruned; 0 until then
    pub pruned: i64,
}

impl Tombstone {
    pub fn for_account(account: &Account, reason: &str, now_ms: i64) -> Self {
        Self {
            id: account.id.clone(),
            email: Some(account.email.clone()),
            reason: Some(reason.to_string()),
            created: account.created,
            deleted: now_ms,
            pruned: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tombstone_from_account() {
        let account = Account::new("acc1".into(), "a@b.com", "hash".into(), 500);
        let tombstone = Tombstone::for_account(&account, "user_deleted", 900);

        assert_eq!(tombstone.id, "acc1");
        assert_eq!(tombstone.email.as_deref(), Some("a@b.com"));
        assert_eq!(tombstone.reason.as_deref(), Some("user_deleted"));
        assert_eq!(tombstone.created, 500);
        assert_eq!(tombstone.deleted, 900);
        assert_eq!(tombstone.pruned, 0);
    }
}
