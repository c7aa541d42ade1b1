//! Infrastructure Layer

pub mod mailer;
pub mod sqlite;

pub use mailer::{LogMailer, Mailer};
pub use sqlite::SqliteStore;
