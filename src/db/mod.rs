//! Store access through a single worker.
//!
//! Layout:
//! - `dispatcher.rs`: caller-facing handle queuing operations
//! - `actor.rs`: the worker owning the connection
//! - `migrate.rs`: opening the store and running schema phases
//! - `registry.rs` / `handler.rs`: pluggable record handlers
//! - `path.rs`: mapping store file names to disk locations
//! - `events.rs`: notifications back to callers

mod actor;
pub mod dispatcher;
pub mod events;
pub mod handler;
mod migrate;
pub mod operation;
pub mod path;
pub mod registry;

pub use courier_schema::{
    SchemaManager, SchemaVersion, TableDefinition, UNREADABLE_VERSION, VersionTable,
};
pub use dispatcher::DbDispatcher;
pub use events::{DbEvent, EventSink};
pub use handler::{DataHandler, HandlerId};
pub use operation::DbOperation;
pub use path::{DataDirResolver, PathResolver, ResolvedPath};
pub use registry::HandlerRegistry;
