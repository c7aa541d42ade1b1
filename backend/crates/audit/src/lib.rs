//! Audit Trail Module
//!
//! Append-only, best-effort-durable log of security and lifecycle events,
//! decoupled from the request path:
//! - `record()` writes a synchronous log line first (the durability floor),
//!   then enqueues the event for a background worker
//! - the worker persists the row and dispatches type-keyed handlers from a
//!   registry built at startup
//! - handler failures are logged and never propagate or block siblings

pub mod event;
pub mod store;
pub mod trail;

pub use event::{AuditEvent, AuditEventKind, AuditLevel};
pub use store::{AuditStore, QueryPage};
pub use trail::{AuditTrail, AuditWorker, HandlerRegistry};

use thiserror::Error;

/// Audit-specific result type alias
pub type AuditResult<T> = Result<T, AuditError>;

/// Audit-specific error variants
#[derive(Debug, Error)]
pub enum AuditError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
