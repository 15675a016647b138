//! Schema contract and migration planning for courier stores.
//!
//! Nothing in this crate touches a connection: tables describe their statements per version,
//! and [`SchemaManager`] orders them into batches for the create, migrate and wipe phases.

pub mod manager;
pub mod table;
pub mod version_table;

pub use manager::{SchemaManager, TableStatements, WipePlan};
pub use table::{SchemaVersion, TableDefinition, UNREADABLE_VERSION};
pub use version_table::{VERSION_COLUMN, VERSION_TABLE, VersionTable};
