use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Code attached to error notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Success = 0,
    General = 1,
}

#[derive(Debug, ThisError)]
pub enum DbError {
    /// Opening the store, enabling foreign keys or creating its directory failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A schema or seed statement failed; the rest of the phase was skipped.
    #[error("Statement failed on table `{table}`: {statement}: {source}")]
    Statement {
        table: String,
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// A handler could not decode its payload.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Dispatcher is closed")]
    Closed,

    #[error("Handler error: {0}")]
    Handler(String),
}

impl DbError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::General
    }
}
