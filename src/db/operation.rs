use crate::db::handler::{DataHandler, HandlerId};
use courier_schema::{SchemaVersion, TableDefinition};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Work item queued to the store worker. Executed exactly once, in submission order.
pub enum DbOperation {
    Save { handler: HandlerId, value: Value },
    Update { handler: HandlerId, value: Value },
    Delete { handler: HandlerId, value: Value },
    ReadOne { handler: HandlerId, value: Value },
    ReadAll { handler: HandlerId },
    /// `read_all` on every handler registered when the broadcast was submitted.
    BroadcastReadAll(Vec<Arc<dyn DataHandler>>),
    SetVersion(SchemaVersion),
    /// Open `filename` and create or migrate the schema. Carries the tables added since the
    /// previous Initialize; they are appended after those already known.
    Initialize {
        filename: String,
        tables: Vec<Box<dyn TableDefinition>>,
    },
    /// A handler was registered; tell it about an already open store.
    HandlerRegistered(Arc<dyn DataHandler>),
    DeleteAll,
    /// Release the connection and stop the worker.
    Close,
}

impl DbOperation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Save { .. } => "save",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::ReadOne { .. } => "read_one",
            Self::ReadAll { .. } => "read_all",
            Self::BroadcastReadAll(_) => "broadcast_read_all",
            Self::SetVersion(_) => "set_version",
            Self::Initialize { .. } => "initialize",
            Self::HandlerRegistered(_) => "handler_registered",
            Self::DeleteAll => "delete_all",
            Self::Close => "close",
        }
    }

    /// Target handler, for operations addressed to one.
    pub fn handler(&self) -> Option<HandlerId> {
        match self {
            Self::Save { handler, .. }
            | Self::Update { handler, .. }
            | Self::Delete { handler, .. }
            | Self::ReadOne { handler, .. }
            | Self::ReadAll { handler } => Some(*handler),
            Self::HandlerRegistered(h) => Some(h.id()),
            _ => None,
        }
    }
}

impl fmt::Debug for DbOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("DbOperation");
        s.field("kind", &self.kind());
        if let Some(id) = self.handler() {
            s.field("handler", &id);
        }
        match self {
            Self::SetVersion(v) => s.field("version", v),
            Self::BroadcastReadAll(handlers) => s.field(
                "handlers",
                &handlers.iter().map(|h| h.id()).collect::<Vec<_>>(),
            ),
            Self::Initialize { filename, tables } => s
                .field("filename", filename)
                .field("tables", &tables.iter().map(|t| t.name()).collect::<Vec<_>>()),
            _ => &mut s,
        };
        s.finish()
    }
}
