//! SQLite Persistence for Audit Events

use sqlx::SqlitePool;

use crate::event::{AuditEvent, AuditEventKind, AuditLevel};
use crate::AuditResult;

/// Page selector for event queries
#[derive(Debug, Clone, Copy)]
pub struct QueryPage {
    pub limit: i64,
    pub offset: i64,
}

impl Default for QueryPage {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

/// SQLite-backed audit event store
#[derive(Clone)]
pub struct AuditStore {
    pool: SqlitePool,
}

impl AuditStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert one event, returning the assigned row id
    pub async fn insert(&self, event: &AuditEvent) -> AuditResult<i64> {
        let data = event.data.to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO audit_events (account_id, kind, level, data, created)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.account_id)
        .bind(event.kind.code())
        .bind(event.level.id())
        .bind(data)
        .bind(event.created)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Events for one account, newest first
    pub async fn events_for_account(
        &self,
        account_id: &str,
        page: QueryPage,
    ) -> AuditResult<Vec<AuditEvent>> {
        let rows = sqlx::query_as::<_, AuditEventRow>(
            r#"
            SELECT id, account_id, kind, level, data, created
            FROM audit_events
            WHERE account_id = ?
            ORDER BY created DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(account_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(AuditEventRow::into_event).collect())
    }

    /// System events (no owning account), newest first
    pub async fn system_events(&self, page: QueryPage) -> AuditResult<Vec<AuditEvent>> {
        let rows = sqlx::query_as::<_, AuditEventRow>(
            r#"
            SELECT id, account_id, kind, level, data, created
            FROM audit_events
            WHERE account_id IS NULL
            ORDER BY created DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(AuditEventRow::into_event).collect())
    }

    /// Count events of one kind since a timestamp, for rate/anomaly logic
    pub async fn count_recent(
        &self,
        kind: AuditEventKind,
        account_id: Option<&str>,
        since_ms: i64,
    ) -> AuditResult<i64> {
        let count = match account_id {
            Some(account_id) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM audit_events WHERE kind = ? AND account_id = ? AND created > ?",
                )
                .bind(kind.code())
                .bind(account_id)
                .bind(since_ms)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM audit_events WHERE kind = ? AND account_id IS NULL AND created > ?",
                )
                .bind(kind.code())
                .bind(since_ms)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(count)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct AuditEventRow {
    id: i64,
    account_id: Option<String>,
    kind: String,
    level: i64,
    data: String,
    created: i64,
}

impl AuditEventRow {
    /// Tolerant mapping: rows with an unknown kind are skipped, corrupt
    /// data columns degrade to an empty object.
    fn into_event(self) -> Option<AuditEvent> {
        let Some(kind) = AuditEventKind::from_code(&self.kind) else {
            tracing::debug!(kind = %self.kind, id = self.id, "unknown audit event kind in storage");
            return None;
        };

        let data = serde_json::from_str(&self.data).unwrap_or_else(|e| {
            tracing::debug!(id = self.id, error = %e, "corrupt audit event data");
            serde_json::json!({})
        });

        Some(AuditEvent {
            id: Some(self.id),
            account_id: self.account_id,
            kind,
            level: AuditLevel::from_id(self.level),
            data,
            created: self.created,
        })
    }
}
