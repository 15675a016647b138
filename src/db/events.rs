use crate::db::handler::HandlerId;
use crate::error::{DbError, ErrorCode};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Notifications emitted by the store worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbEvent {
    /// Initialize succeeded; the store is open and at the configured version.
    Ready,
    Error {
        description: String,
        code: ErrorCode,
    },
    /// A handler's `read_all` callback returned.
    ReadAllFinished(HandlerId),
}

/// Cloneable sender side of the notification stream.
///
/// Every subscriber gets its own unbounded queue, so a slow subscriber never loses events.
/// Queues whose receiver was dropped are pruned on the next emit.
#[derive(Clone, Default)]
pub struct EventSink {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<DbEvent>>>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<DbEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn emit(&self, event: DbEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        if subscribers.is_empty() {
            debug!(?event, "DbEvent dropped: no subscribers");
        }
    }

    pub fn ready(&self) {
        self.emit(DbEvent::Ready);
    }

    pub fn read_all_finished(&self, id: HandlerId) {
        self.emit(DbEvent::ReadAllFinished(id));
    }

    pub fn report_error(&self, err: &DbError) {
        warn!(error = %err, "store operation failed");
        self.emit(DbEvent::Error {
            description: err.to_string(),
            code: err.code(),
        });
    }
}
