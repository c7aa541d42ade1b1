//! Audit Trail
//!
//! `record()` is the single write entry point. It always emits the log
//! line synchronously, then hands the event to an outbound queue consumed
//! by [`AuditWorker`]. A slow or failing persistence step therefore never
//! adds latency or failure risk to the request that triggered the event;
//! the trade-off is a short window where the event exists only in the
//! operational log.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tokio::sync::mpsc;

use platform::clock::Clock;

use crate::event::{AuditEvent, AuditEventKind, AuditLevel};
use crate::store::{AuditStore, QueryPage};
use crate::AuditResult;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
type Handler = Box<dyn Fn(&AuditEvent) -> Result<(), HandlerError> + Send + Sync>;

/// Type-keyed reactions to persisted events, built once at startup.
///
/// An explicit registry (instead of a module-level table) keeps
/// initialization order deterministic.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<AuditEventKind, Vec<Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind
    ///
    /// Example: `registry.on(AuditEventKind::AccountInvalidPassword, check_brute_force)`
    pub fn on<F>(mut self, kind: AuditEventKind, handler: F) -> Self
    where
        F: Fn(&AuditEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
        self
    }

    /// Run every handler registered for the event's kind.
    ///
    /// A failing handler is logged and must not block its siblings.
    fn dispatch(&self, event: &AuditEvent) {
        let Some(handlers) = self.handlers.get(&event.kind) else {
            return;
        };
        for handler in handlers {
            if let Err(e) = handler(event) {
                tracing::error!(kind = %event.kind, error = %e, "audit handler failed");
            }
        }
    }
}

/// Append-only audit trail
#[derive(Clone)]
pub struct AuditTrail {
    tx: mpsc::UnboundedSender<AuditEvent>,
    store: AuditStore,
    clock: Arc<dyn Clock>,
}

impl AuditTrail {
    /// Build the trail and its worker.
    ///
    /// The caller spawns [`AuditWorker::run`] on the runtime; the worker
    /// exits once every `AuditTrail` clone has been dropped.
    pub fn new(
        store: AuditStore,
        registry: HandlerRegistry,
        clock: Arc<dyn Clock>,
    ) -> (Self, AuditWorker) {
        let (tx, rx) = mpsc::unbounded_channel();

        let trail = Self {
            tx,
            store: store.clone(),
            clock,
        };
        let worker = AuditWorker {
            rx,
            store,
            registry,
        };

        (trail, worker)
    }

    /// Record one event.
    ///
    /// The synchronous log line is written no matter what happens to the
    /// deferred persistence step. Enqueue failures are logged and
    /// swallowed; once queued, the event runs to completion or fails
    /// silently in the worker.
    pub fn record(
        &self,
        kind: AuditEventKind,
        account_id: Option<&str>,
        level: AuditLevel,
        data: JsonValue,
    ) {
        match level {
            AuditLevel::Ok | AuditLevel::Info => {
                tracing::info!(target: "audit", kind = %kind, account_id = account_id.unwrap_or("-"), level = %level, data = %data);
            }
            AuditLevel::Warn => {
                tracing::warn!(target: "audit", kind = %kind, account_id = account_id.unwrap_or("-"), level = %level, data = %data);
            }
            AuditLevel::Error | AuditLevel::Critical => {
                tracing::error!(target: "audit", kind = %kind, account_id = account_id.unwrap_or("-"), level = %level, data = %data);
            }
        }

        let event = AuditEvent {
            id: None,
            account_id: account_id.map(str::to_string),
            kind,
            level,
            data,
            created: self.clock.now_ms(),
        };

        if self.tx.send(event).is_err() {
            tracing::error!(kind = %kind, "audit queue closed, event not persisted");
        }
    }

    /// Events for one account, newest first
    pub async fn events_for_account(
        &self,
        account_id: &str,
        page: QueryPage,
    ) -> AuditResult<Vec<AuditEvent>> {
        self.store.events_for_account(account_id, page).await
    }

    /// System events, newest first
    pub async fn system_events(&self, page: QueryPage) -> AuditResult<Vec<AuditEvent>> {
        self.store.system_events(page).await
    }

    /// Count events of one kind since a timestamp
    pub async fn count_recent(
        &self,
        kind: AuditEventKind,
        account_id: Option<&str>,
        since_ms: i64,
    ) -> AuditResult<i64> {
        self.store.count_recent(kind, account_id, since_ms).await
    }
}

/// Background consumer of the audit queue
pub struct AuditWorker {
    rx: mpsc::UnboundedReceiver<AuditEvent>,
    store: AuditStore,
    registry: HandlerRegistry,
}

impl AuditWorker {
    /// Drain the queue until the channel closes.
    ///
    /// Handlers run only after the row is durable, so they can rely on
    /// `event.id` being set.
    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            self.handle(event).await;
        }
    }

    /// Process everything currently queued, then return.
    ///
    /// Lets tests and graceful shutdown observe a drained queue without
    /// closing the channel.
    pub async fn drain_pending(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.handle(event).await;
        }
    }

    async fn handle(&self, mut event: AuditEvent) {
        match self.store.insert(&event).await {
            Ok(id) => {
                event.id = Some(id);
                self.registry.dispatch(&event);
            }
            Err(e) => {
                tracing::error!(kind = %event.kind, error = %e, "failed to persist audit event");
            }
        }
    }
}
