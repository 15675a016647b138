use crate::config::StoreConfig;
use crate::db::actor::{DbWorker, DbWorkerArgs};
use crate::db::events::{DbEvent, EventSink};
use crate::db::handler::{DataHandler, HandlerId};
use crate::db::operation::DbOperation;
use crate::db::path::PathResolver;
use crate::db::registry::HandlerRegistry;
use crate::error::DbError;
use courier_schema::{SchemaVersion, TableDefinition};
use ractor::{Actor, ActorRef};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Caller-facing side of the store.
///
/// Every submission is queued to a single worker and returns immediately; results arrive as
/// [`DbEvent`]s. Operations run in the order they were submitted.
pub struct DbDispatcher {
    actor: ActorRef<DbOperation>,
    registry: Arc<HandlerRegistry>,
    events: EventSink,
    /// Tables waiting for the first Initialize. `None` once it has been submitted.
    pending_tables: Mutex<Option<Vec<Box<dyn TableDefinition>>>>,
    /// `true` once closed. Held for reading while casting so nothing lands behind `Close`.
    closed: RwLock<bool>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl DbDispatcher {
    /// Spawn the store worker. The store itself is opened by [`initialize`].
    ///
    /// [`initialize`]: DbDispatcher::initialize
    pub async fn spawn(cfg: StoreConfig, resolver: Arc<dyn PathResolver>) -> Result<Self, DbError> {
        let registry = Arc::new(HandlerRegistry::new());
        let events = EventSink::new();
        let args = DbWorkerArgs {
            registry: registry.clone(),
            events: events.clone(),
            resolver,
            cfg,
        };
        let (actor, join) = Actor::spawn(None, DbWorker, args)
            .await
            .map_err(|e| DbError::RactorError(format!("DbWorker spawn failed: {e}")))?;

        Ok(Self {
            actor,
            registry,
            events,
            pending_tables: Mutex::new(Some(Vec::new())),
            closed: RwLock::new(false),
            join: Mutex::new(Some(join)),
        })
    }

    /// New notification stream. Receives everything emitted from now on, without loss.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<DbEvent> {
        self.events.subscribe()
    }

    /// Sender for handlers that want to report errors of their own.
    pub fn event_sink(&self) -> EventSink {
        self.events.clone()
    }

    /// Register a table after those already added. Only honoured before the first Initialize.
    pub fn add_table<T: TableDefinition + 'static>(&self, table: T) {
        let mut pending = self
            .pending_tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match pending.as_mut() {
            Some(tables) => tables.push(Box::new(table)),
            None => warn!(
                table = table.name(),
                "table added after initialize, ignored"
            ),
        }
    }

    pub fn set_version(&self, version: SchemaVersion) -> Result<(), DbError> {
        self.submit(DbOperation::SetVersion(version))
    }

    /// Open `filename` and create or migrate its schema. Reported as `Ready` or `Error`.
    pub fn initialize(&self, filename: impl Into<String>) -> Result<(), DbError> {
        let tables = self
            .pending_tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_default();
        self.submit(DbOperation::Initialize {
            filename: filename.into(),
            tables,
        })
    }

    /// Insert or replace a handler. Handlers are never removed.
    pub fn register_handler(&self, handler: Arc<dyn DataHandler>) {
        self.registry.register(handler.clone());
        if let Err(e) = self.submit(DbOperation::HandlerRegistered(handler)) {
            debug!(error = %e, "handler registered on a closed dispatcher");
        }
    }

    pub fn get_handler(&self, id: &HandlerId) -> Option<Arc<dyn DataHandler>> {
        self.registry.get(id)
    }

    pub fn save(&self, handler: HandlerId, value: Value) -> Result<(), DbError> {
        self.submit(DbOperation::Save { handler, value })
    }

    pub fn update(&self, handler: HandlerId, value: Value) -> Result<(), DbError> {
        self.submit(DbOperation::Update { handler, value })
    }

    pub fn delete(&self, handler: HandlerId, value: Value) -> Result<(), DbError> {
        self.submit(DbOperation::Delete { handler, value })
    }

    pub fn read_one(&self, handler: HandlerId, value: Value) -> Result<(), DbError> {
        self.submit(DbOperation::ReadOne { handler, value })
    }

    pub fn read_all_from_handler(&self, handler: HandlerId) -> Result<(), DbError> {
        self.submit(DbOperation::ReadAll { handler })
    }

    /// `read_all` on every handler registered right now; one `ReadAllFinished` per handler.
    /// Handlers registered after this call are not included.
    pub fn read_all(&self) -> Result<(), DbError> {
        self.submit(DbOperation::BroadcastReadAll(self.registry.snapshot_all()))
    }

    /// Wipe every table except the version table and reseed initial rows.
    pub fn delete_all_data(&self) -> Result<(), DbError> {
        self.submit(DbOperation::DeleteAll)
    }

    /// Stop accepting work, let the worker finish everything already queued, release the
    /// connection and wait for the worker to exit. There is no timeout.
    pub async fn close(&self) -> Result<(), DbError> {
        {
            let mut closed = self.closed.write().unwrap_or_else(PoisonError::into_inner);
            if !*closed {
                *closed = true;
                ractor::cast!(self.actor, DbOperation::Close)
                    .map_err(|e| DbError::RactorError(format!("DbWorker close cast failed: {e}")))?;
            }
        }

        let join = self.join.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(join) = join {
            join.await
                .map_err(|e| DbError::RactorError(format!("DbWorker join failed: {e}")))?;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn submit(&self, op: DbOperation) -> Result<(), DbError> {
        let closed = self.closed.read().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            return Err(DbError::Closed);
        }
        let kind = op.kind();
        debug!(op = kind, handler = ?op.handler(), "queued");
        ractor::cast!(self.actor, op)
            .map_err(|e| DbError::RactorError(format!("DbWorker {kind} cast failed: {e}")))
    }
}

impl Drop for DbDispatcher {
    // Queued work still drains in the background.
    fn drop(&mut self) {
        let closed = self.closed.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !*closed {
            *closed = true;
            let _ = ractor::cast!(self.actor, DbOperation::Close);
        }
    }
}
