//! Auth (Authentication & Session Lifecycle) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, payload model, repository traits
//! - `application/` - Token store, session manager, account directory,
//!   account service, configuration
//! - `infra/` - SQLite repository, mailer
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Multi-kind security tokens (session, email verification, password
//!   reset, single-use login link) over one storage shape
//! - Cookie-bound server-side sessions with activity tracking and
//!   one-shot flash messages
//! - Step-up privilege elevation for sensitive actions, carried in a
//!   second strict cookie and compared constant-time
//! - Account lifecycle with tombstoned deletion
//!
//! ## Security Model
//! - Token ids drawn from a 64-symbol alphabet via a CSPRNG (192 bits at
//!   the default length)
//! - Passwords hashed with Argon2id; policy plus breach-corpus check
//! - Sessions and elevations expire independently; expired state clears
//!   its own cookie

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::account_directory::AccountDirectory;
pub use application::account_service::AccountService;
pub use application::config::AuthConfig;
pub use application::session::{ResolvedSession, SessionManager};
pub use application::token_store::TokenStore;
pub use error::{AuthError, AuthResult};
pub use infra::sqlite::SqliteStore;
pub use presentation::router::auth_router;

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}

#[cfg(test)]
mod tests;
