use crate::config::StoreConfig;
use crate::db::events::EventSink;
use crate::db::handler::{DataHandler, HandlerId};
use crate::db::migrate;
use crate::db::operation::DbOperation;
use crate::db::path::PathResolver;
use crate::db::registry::HandlerRegistry;
use crate::error::DbError;
use courier_schema::SchemaManager;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use serde_json::Value;
use sqlx::{Connection, SqliteConnection};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handler callback requested by a queued operation.
enum Callback {
    Save(Value),
    Update(Value),
    Delete(Value),
    ReadOne(Value),
    ReadAll,
}

impl Callback {
    fn name(&self) -> &'static str {
        match self {
            Callback::Save(_) => "save",
            Callback::Update(_) => "update",
            Callback::Delete(_) => "delete",
            Callback::ReadOne(_) => "read_one",
            Callback::ReadAll => "read_all",
        }
    }
}

pub(crate) struct DbWorkerArgs {
    pub registry: Arc<HandlerRegistry>,
    pub events: EventSink,
    pub resolver: Arc<dyn PathResolver>,
    pub cfg: StoreConfig,
}

pub(crate) struct DbWorkerState {
    schema: SchemaManager,
    conn: Option<SqliteConnection>,
    /// Handlers told about the current connection.
    opened: Vec<Arc<dyn DataHandler>>,
    registry: Arc<HandlerRegistry>,
    events: EventSink,
    resolver: Arc<dyn PathResolver>,
    cfg: StoreConfig,
}

/// Sole owner of the store connection. Runs queued operations one at a time.
pub(crate) struct DbWorker;

#[ractor::async_trait]
impl Actor for DbWorker {
    type Msg = DbOperation;
    type State = DbWorkerState;
    type Arguments = DbWorkerArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        debug!("DbWorker started");
        Ok(DbWorkerState {
            schema: SchemaManager::new(),
            conn: None,
            opened: Vec::new(),
            registry: args.registry,
            events: args.events,
            resolver: args.resolver,
            cfg: args.cfg,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        // Failures are reported as events; returning Err would stop the worker.
        match message {
            DbOperation::Save { handler, value } => {
                self.invoke(state, handler, Callback::Save(value)).await;
            }
            DbOperation::Update { handler, value } => {
                self.invoke(state, handler, Callback::Update(value)).await;
            }
            DbOperation::Delete { handler, value } => {
                self.invoke(state, handler, Callback::Delete(value)).await;
            }
            DbOperation::ReadOne { handler, value } => {
                self.invoke(state, handler, Callback::ReadOne(value)).await;
            }
            DbOperation::ReadAll { handler } => {
                self.invoke(state, handler, Callback::ReadAll).await;
            }
            DbOperation::BroadcastReadAll(handlers) => {
                self.handle_broadcast_read_all(state, handlers).await;
            }
            DbOperation::SetVersion(version) => {
                debug!(version, "schema version configured");
                state.schema.set_version(version);
            }
            DbOperation::Initialize { filename, tables } => {
                for table in tables {
                    state.schema.add_table(table);
                }
                self.handle_initialize(state, &filename).await;
            }
            DbOperation::HandlerRegistered(handler) => {
                self.handle_registered(state, handler).await;
            }
            DbOperation::DeleteAll => {
                self.handle_delete_all(state).await;
            }
            DbOperation::Close => {
                self.release(state).await;
                info!("DbWorker closed, queue drained");
                myself.stop(None);
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        self.release(state).await;
        Ok(())
    }
}

impl DbWorker {
    async fn invoke(&self, state: &mut DbWorkerState, id: HandlerId, callback: Callback) {
        let op = callback.name();
        let is_read_all = matches!(callback, Callback::ReadAll);
        let Some(handler) = state.registry.get(&id) else {
            debug!(handler = %id, op, "unknown handler, operation dropped");
            return;
        };
        let Some(conn) = state.conn.as_mut() else {
            warn!(handler = %id, op, "store not open, operation dropped");
            return;
        };

        let result = match callback {
            Callback::Save(value) => handler.save(value, conn).await,
            Callback::Update(value) => handler.update(value, conn).await,
            Callback::Delete(value) => handler.delete(value, conn).await,
            Callback::ReadOne(value) => handler.read_one(value, conn).await,
            Callback::ReadAll => handler.read_all(conn).await,
        };
        if let Err(e) = result {
            state.events.report_error(&e);
        }
        if is_read_all {
            state.events.read_all_finished(id);
        }
    }

    async fn handle_broadcast_read_all(
        &self,
        state: &mut DbWorkerState,
        handlers: Vec<Arc<dyn DataHandler>>,
    ) {
        let Some(conn) = state.conn.as_mut() else {
            warn!("store not open, broadcast read dropped");
            return;
        };

        debug!(handlers = handlers.len(), "broadcasting read_all");
        for handler in handlers {
            if let Err(e) = handler.read_all(conn).await {
                state.events.report_error(&e);
            }
            state.events.read_all_finished(handler.id());
        }
    }

    async fn handle_initialize(&self, state: &mut DbWorkerState, filename: &str) {
        self.release(state).await;

        let resolved = state.resolver.resolve(filename);
        match migrate::initialize(&state.schema, &resolved, &state.cfg).await {
            Ok(conn) => {
                state.conn = Some(conn);
                for handler in state.registry.snapshot_all() {
                    self.notify_opened(state, handler).await;
                }
                info!(
                    path = %resolved.path.display(),
                    version = state.schema.version(),
                    "store ready"
                );
                state.events.ready();
            }
            Err(e) => {
                warn!(path = %resolved.path.display(), "store initialize failed");
                state.events.report_error(&e);
            }
        }
    }

    async fn handle_registered(&self, state: &mut DbWorkerState, handler: Arc<dyn DataHandler>) {
        if state.conn.is_none() {
            return;
        }
        // Replaced again before we got here; the newer registration has its own message.
        let current = state.registry.get(&handler.id());
        if !current.is_some_and(|c| Arc::ptr_eq(&c, &handler)) {
            return;
        }
        self.notify_opened(state, handler).await;
    }

    async fn notify_opened(&self, state: &mut DbWorkerState, handler: Arc<dyn DataHandler>) {
        if state.opened.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            return;
        }
        let Some(conn) = state.conn.as_mut() else {
            return;
        };
        if let Err(e) = handler.database_opened(conn).await {
            state.events.report_error(&e);
        }
        state.opened.push(handler);
    }

    async fn handle_delete_all(&self, state: &mut DbWorkerState) {
        let Some(conn) = state.conn.as_mut() else {
            warn!("store not open, delete all dropped");
            return;
        };
        let failures =
            migrate::delete_all_data(conn, &state.schema, state.cfg.transactional_phases).await;
        for e in &failures {
            state.events.report_error(e);
        }
    }

    /// Tell handlers the store is going away, then close the connection.
    async fn release(&self, state: &mut DbWorkerState) {
        let Some(conn) = state.conn.take() else {
            return;
        };
        for handler in state.opened.drain(..) {
            handler.database_closed().await;
        }
        if let Err(e) = conn.close().await {
            state.events.report_error(&DbError::DatabaseError(e));
        }
        debug!("store connection released");
    }
}
