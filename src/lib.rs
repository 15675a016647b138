pub mod config;
pub mod db;
pub mod error;

pub use db::{DataHandler, DbDispatcher, DbEvent, TableDefinition};
pub use error::{DbError, ErrorCode};
