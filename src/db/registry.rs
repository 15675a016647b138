use crate::db::handler::{DataHandler, HandlerId};
use ahash::RandomState;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Handlers by id. Shared between callers and the store worker.
///
/// The lock is only held to copy `Arc`s in or out; callbacks always run after it is released.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<HandlerId, Arc<dyn DataHandler>, RandomState>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the handler under its id. Returns the replaced one, if any.
    pub fn register(&self, handler: Arc<dyn DataHandler>) -> Option<Arc<dyn DataHandler>> {
        let id = handler.id();
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, handler)
    }

    pub fn get(&self, id: &HandlerId) -> Option<Arc<dyn DataHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn snapshot_all(&self) -> Vec<Arc<dyn DataHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
