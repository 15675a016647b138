//! Runs schema plans against the live connection.
//!
//! Phases stop at the first failing statement. Unless `transactional` is set, statements that
//! already ran stay applied.

use crate::config::StoreConfig;
use crate::db::path::ResolvedPath;
use crate::error::DbError;
use courier_schema::{
    SchemaManager, SchemaVersion, TableStatements, UNREADABLE_VERSION, VersionTable,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Connection, SqliteConnection};
use tracing::{debug, info, warn};

/// Open the store, then create or migrate its schema.
///
/// On a statement failure the connection is released before the error is returned.
pub(crate) async fn initialize(
    schema: &SchemaManager,
    resolved: &ResolvedPath,
    cfg: &StoreConfig,
) -> Result<SqliteConnection, DbError> {
    let mut conn = open(resolved, cfg).await?;

    // A file left behind by a rolled-back create has no version table yet.
    let is_new = !resolved.exists || !version_table_exists(&mut conn).await;
    let plan = if is_new {
        info!(
            path = %resolved.path.display(),
            version = schema.version(),
            tables = ?schema.table_names(),
            "creating store"
        );
        schema.create_plan()
    } else {
        let stored = read_stored_version(&mut conn).await;
        if schema.version() > stored {
            info!(
                path = %resolved.path.display(),
                stored,
                target = schema.version(),
                "store is outdated, running updates"
            );
        } else {
            debug!(stored, target = schema.version(), "store is current");
        }
        schema.migration_plan(stored)
    };

    if let Err(e) = run_phase(&mut conn, cfg.transactional_phases, &plan).await {
        if let Err(close_err) = conn.close().await {
            warn!(error = %close_err, "closing store after failed initialize");
        }
        return Err(e);
    }
    Ok(conn)
}

/// Delete every row (reverse registration order), then reseed all but the version table.
///
/// The two steps are separate phases: a failing delete is reported and the reseed still runs.
/// Returns every failure, in order.
pub(crate) async fn delete_all_data(
    conn: &mut SqliteConnection,
    schema: &SchemaManager,
    transactional: bool,
) -> Vec<DbError> {
    let plan = schema.wipe_plan();
    let mut failures = Vec::new();
    if let Err(e) = run_phase(conn, transactional, &plan.deletes).await {
        failures.push(e);
    }
    if let Err(e) = run_phase(conn, transactional, &plan.reseeds).await {
        failures.push(e);
    }
    if failures.is_empty() {
        info!(version = schema.version(), "store wiped and reseeded");
    }
    failures
}

async fn open(resolved: &ResolvedPath, cfg: &StoreConfig) -> Result<SqliteConnection, DbError> {
    if resolved.create_dirs {
        if let Some(dir) = resolved.path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                DbError::Connection(format!("create directory {}: {e}", dir.display()))
            })?;
        }
    }

    let journal_mode = if cfg.wal {
        SqliteJournalMode::Wal
    } else {
        SqliteJournalMode::Delete
    };
    let opts = SqliteConnectOptions::new()
        .filename(&resolved.path)
        .create_if_missing(true)
        .busy_timeout(cfg.busy_timeout())
        .journal_mode(journal_mode);

    let mut conn = SqliteConnection::connect_with(&opts)
        .await
        .map_err(|e| DbError::Connection(format!("open {}: {e}", resolved.path.display())))?;

    if let Err(e) = sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(&mut conn)
        .await
    {
        let _ = conn.close().await;
        return Err(DbError::Connection(format!("enable foreign keys: {e}")));
    }

    debug!(path = %resolved.path.display(), "store opened");
    Ok(conn)
}

async fn version_table_exists(conn: &mut SqliteConnection) -> bool {
    let query = VersionTable::exists_statement();
    match sqlx::query_scalar::<_, i64>(&query)
        .fetch_one(&mut *conn)
        .await
    {
        Ok(count) => count > 0,
        Err(e) => {
            warn!(error = %e, "cannot inspect store tables, treating store as existing");
            true
        }
    }
}

pub(crate) async fn read_stored_version(conn: &mut SqliteConnection) -> SchemaVersion {
    let query = VersionTable::select_statement();
    match sqlx::query_scalar::<_, i64>(&query)
        .fetch_optional(&mut *conn)
        .await
    {
        Ok(Some(version)) => {
            debug!(version, "read store version");
            version
        }
        Ok(None) => {
            warn!("version row missing, treating store as older than any version");
            UNREADABLE_VERSION
        }
        Err(e) => {
            warn!(error = %e, "version unreadable, treating store as older than any version");
            UNREADABLE_VERSION
        }
    }
}

async fn run_phase(
    conn: &mut SqliteConnection,
    transactional: bool,
    batches: &[TableStatements],
) -> Result<(), DbError> {
    if !transactional {
        return run_batches(conn, batches).await;
    }
    let mut tx = conn.begin().await?;
    run_batches(&mut tx, batches).await?;
    tx.commit().await?;
    Ok(())
}

async fn run_batches(
    conn: &mut SqliteConnection,
    batches: &[TableStatements],
) -> Result<(), DbError> {
    for batch in batches {
        for statement in &batch.statements {
            debug!(table = %batch.table, sql = %statement, "executing");
            sqlx::query(statement)
                .persistent(false)
                .execute(&mut *conn)
                .await
                .map_err(|source| DbError::Statement {
                    table: batch.table.clone(),
                    statement: statement.clone(),
                    source,
                })?;
        }
    }
    Ok(())
}
