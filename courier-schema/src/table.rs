/// Schema version of a store. Versions only ever move forward.
pub type SchemaVersion = i64;

/// Version reported for a store whose version row cannot be read.
/// Lower than any real version, so every table is offered an update.
pub const UNREADABLE_VERSION: SchemaVersion = -1;

/// Lifecycle statements of one table.
///
/// Implementations are registered before the store is initialized and are read-only from then on.
/// Registration order matters: tables are created and updated in that order and wiped in reverse.
pub trait TableDefinition: Send + Sync {
    /// Table name, used when reporting a failing statement.
    fn name(&self) -> &str;

    /// Statements creating the table in its `target` shape on a fresh store.
    fn create_statements(&self, target: SchemaVersion) -> Vec<String>;

    /// Whether moving the store from `old` to `new` requires [`update_statements`].
    ///
    /// [`update_statements`]: TableDefinition::update_statements
    fn needs_update(&self, old: SchemaVersion, new: SchemaVersion) -> bool;

    fn update_statements(&self, old: SchemaVersion, new: SchemaVersion) -> Vec<String>;

    /// Statements removing every row. May be empty.
    fn delete_statements(&self) -> Vec<String>;

    /// Rows seeded into a freshly created or wiped table.
    fn initial_rows(&self, _target: SchemaVersion) -> Vec<String> {
        Vec::new()
    }
}
