//! Pluggable record handlers driven by the store worker.

use crate::error::DbError;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::SqliteConnection;
use uuid::Uuid;

pub type HandlerId = Uuid;

/// Save/update/delete/read callbacks for one logical record type.
///
/// Every callback runs on the store worker with exclusive use of the connection. Returning an
/// error reports it as a `DbEvent::Error`; the worker carries on with the next operation.
#[async_trait]
pub trait DataHandler: Send + Sync + 'static {
    fn id(&self) -> HandlerId;

    /// The store was opened, or this handler was registered while it already was.
    async fn database_opened(&self, _conn: &mut SqliteConnection) -> Result<(), DbError> {
        Ok(())
    }

    /// The connection is about to be released. Drop anything tied to it.
    async fn database_closed(&self) {}

    async fn save(&self, _value: Value, _conn: &mut SqliteConnection) -> Result<(), DbError> {
        Ok(())
    }

    async fn update(&self, _value: Value, _conn: &mut SqliteConnection) -> Result<(), DbError> {
        Ok(())
    }

    async fn delete(&self, _value: Value, _conn: &mut SqliteConnection) -> Result<(), DbError> {
        Ok(())
    }

    async fn read_one(&self, _value: Value, _conn: &mut SqliteConnection) -> Result<(), DbError> {
        Ok(())
    }

    async fn read_all(&self, _conn: &mut SqliteConnection) -> Result<(), DbError> {
        Ok(())
    }
}
