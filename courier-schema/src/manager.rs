use crate::table::{SchemaVersion, TableDefinition};
use crate::version_table::VersionTable;

/// Ordered statements for one table within a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStatements {
    pub table: String,
    pub statements: Vec<String>,
}

impl TableStatements {
    fn new(table: &str, statements: impl IntoIterator<Item = String>) -> Self {
        Self {
            table: table.to_string(),
            statements: statements
                .into_iter()
                .filter(|s| !s.trim().is_empty())
                .collect(),
        }
    }
}

/// Statements for wiping a store: deletes (reverse registration order), then reseeds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WipePlan {
    pub deletes: Vec<TableStatements>,
    pub reseeds: Vec<TableStatements>,
}

/// Registered tables plus the schema version the application expects.
///
/// The version table is always the first entry. Plans are executed batch by batch and a phase
/// stops at its first failing statement.
pub struct SchemaManager {
    tables: Vec<Box<dyn TableDefinition>>,
    version: SchemaVersion,
}

impl Default for SchemaManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaManager {
    pub fn new() -> Self {
        Self {
            tables: vec![Box::new(VersionTable)],
            version: 0,
        }
    }

    pub fn add_table(&mut self, table: Box<dyn TableDefinition>) {
        self.tables.push(table);
    }

    pub fn set_version(&mut self, version: SchemaVersion) {
        self.version = version;
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Registered table names in registration order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name()).collect()
    }

    /// Fresh store: create every table, each followed by its initial rows.
    pub fn create_plan(&self) -> Vec<TableStatements> {
        self.tables
            .iter()
            .map(|t| {
                let statements = t
                    .create_statements(self.version)
                    .into_iter()
                    .chain(t.initial_rows(self.version));
                TableStatements::new(t.name(), statements)
            })
            .collect()
    }

    /// Existing store at `stored`: updates for every table that asks for one.
    ///
    /// Empty when the store is already at or beyond the configured version.
    pub fn migration_plan(&self, stored: SchemaVersion) -> Vec<TableStatements> {
        if self.version <= stored {
            return Vec::new();
        }
        self.tables
            .iter()
            .filter(|t| t.needs_update(stored, self.version))
            .map(|t| TableStatements::new(t.name(), t.update_statements(stored, self.version)))
            .collect()
    }

    /// Remove all rows, then reseed every table except the version table.
    pub fn wipe_plan(&self) -> WipePlan {
        let deletes = self
            .tables
            .iter()
            .rev()
            .map(|t| TableStatements::new(t.name(), t.delete_statements()))
            .collect();
        let reseeds = self
            .tables
            .iter()
            .skip(1)
            .map(|t| TableStatements::new(t.name(), t.initial_rows(self.version)))
            .collect();
        WipePlan { deletes, reseeds }
    }
}
