use crate::table::{SchemaVersion, TableDefinition};

pub const VERSION_TABLE: &str = "dbversion";
pub const VERSION_COLUMN: &str = "majorversion";

/// Built-in single-row table holding the schema version of the store.
///
/// Always registered first. It has no delete statements, so wiping a store never touches it.
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionTable;

impl VersionTable {
    /// Query reading the stored version.
    pub fn select_statement() -> String {
        format!("SELECT {VERSION_COLUMN} FROM {VERSION_TABLE}")
    }

    /// Query counting version tables in an SQLite store: `1` once the schema was created.
    pub fn exists_statement() -> String {
        format!(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '{VERSION_TABLE}'"
        )
    }
}

impl TableDefinition for VersionTable {
    fn name(&self) -> &str {
        VERSION_TABLE
    }

    fn create_statements(&self, _target: SchemaVersion) -> Vec<String> {
        vec![format!(
            "CREATE TABLE {VERSION_TABLE} ({VERSION_COLUMN} INTEGER PRIMARY KEY)"
        )]
    }

    fn needs_update(&self, old: SchemaVersion, new: SchemaVersion) -> bool {
        new > old
    }

    // Delete + insert rather than UPDATE so a lost row is restored.
    fn update_statements(&self, _old: SchemaVersion, new: SchemaVersion) -> Vec<String> {
        vec![
            format!("DELETE FROM {VERSION_TABLE}"),
            format!("INSERT INTO {VERSION_TABLE} ({VERSION_COLUMN}) VALUES ({new})"),
        ]
    }

    fn delete_statements(&self) -> Vec<String> {
        Vec::new()
    }

    fn initial_rows(&self, target: SchemaVersion) -> Vec<String> {
        vec![format!(
            "INSERT INTO {VERSION_TABLE} ({VERSION_COLUMN}) VALUES ({target})"
        )]
    }
}
