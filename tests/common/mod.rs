#![allow(dead_code)]

use async_trait::async_trait;
use courier::config::StoreConfig;
use courier::db::{
    DataDirResolver, DataHandler, DbDispatcher, DbEvent, HandlerId, SchemaVersion,
    TableDefinition,
};
use courier::DbError;
use serde::Deserialize;
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const STORE_FILE: &str = "store.db";

/// `items (id, name)`; version 2 adds a `note` column. Seeded with two rows.
pub struct ItemsTable;

impl TableDefinition for ItemsTable {
    fn name(&self) -> &str {
        "items"
    }

    fn create_statements(&self, target: SchemaVersion) -> Vec<String> {
        if target >= 2 {
            vec!["CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL, note TEXT)".into()]
        } else {
            vec!["CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL)".into()]
        }
    }

    fn needs_update(&self, old: SchemaVersion, new: SchemaVersion) -> bool {
        old < 2 && new >= 2
    }

    fn update_statements(&self, _old: SchemaVersion, _new: SchemaVersion) -> Vec<String> {
        vec!["ALTER TABLE items ADD COLUMN note TEXT".into()]
    }

    fn delete_statements(&self) -> Vec<String> {
        vec!["DELETE FROM items".into()]
    }

    fn initial_rows(&self, _target: SchemaVersion) -> Vec<String> {
        vec![
            "INSERT INTO items (name) VALUES ('alpha')".into(),
            "INSERT INTO items (name) VALUES ('beta')".into(),
        ]
    }
}

/// `tags` referencing `items`; seeded with one tag on item 1.
pub struct TagsTable;

impl TableDefinition for TagsTable {
    fn name(&self) -> &str {
        "tags"
    }

    fn create_statements(&self, _target: SchemaVersion) -> Vec<String> {
        vec![
            "CREATE TABLE tags (id INTEGER PRIMARY KEY, item INTEGER NOT NULL REFERENCES items(id), label TEXT NOT NULL)"
                .into(),
        ]
    }

    fn needs_update(&self, _old: SchemaVersion, _new: SchemaVersion) -> bool {
        false
    }

    fn update_statements(&self, _old: SchemaVersion, _new: SchemaVersion) -> Vec<String> {
        Vec::new()
    }

    fn delete_statements(&self) -> Vec<String> {
        vec!["DELETE FROM tags".into()]
    }

    fn initial_rows(&self, _target: SchemaVersion) -> Vec<String> {
        vec!["INSERT INTO tags (item, label) VALUES (1, 'starter')".into()]
    }
}

/// Table whose statements are all invalid SQL.
pub struct BrokenTable;

impl TableDefinition for BrokenTable {
    fn name(&self) -> &str {
        "broken"
    }

    fn create_statements(&self, _target: SchemaVersion) -> Vec<String> {
        vec!["CREATE TABLE broken (".into()]
    }

    fn needs_update(&self, _old: SchemaVersion, _new: SchemaVersion) -> bool {
        true
    }

    fn update_statements(&self, _old: SchemaVersion, _new: SchemaVersion) -> Vec<String> {
        vec!["ALTER TABLE broken ADD COLUMN".into()]
    }

    fn delete_statements(&self) -> Vec<String> {
        vec!["DELETE FROM nowhere".into()]
    }
}

/// Plain table created after `broken`, to observe where a phase stopped.
pub struct LaterTable;

impl TableDefinition for LaterTable {
    fn name(&self) -> &str {
        "later"
    }

    fn create_statements(&self, _target: SchemaVersion) -> Vec<String> {
        vec!["CREATE TABLE later (id INTEGER PRIMARY KEY)".into()]
    }

    fn needs_update(&self, _old: SchemaVersion, _new: SchemaVersion) -> bool {
        false
    }

    fn update_statements(&self, _old: SchemaVersion, _new: SchemaVersion) -> Vec<String> {
        Vec::new()
    }

    fn delete_statements(&self) -> Vec<String> {
        vec!["DELETE FROM later".into()]
    }
}

/// Creates and seeds fine, but its delete statement targets a missing table.
pub struct StaleTable;

impl TableDefinition for StaleTable {
    fn name(&self) -> &str {
        "stale"
    }

    fn create_statements(&self, _target: SchemaVersion) -> Vec<String> {
        vec!["CREATE TABLE stale (id INTEGER PRIMARY KEY, label TEXT NOT NULL)".into()]
    }

    fn needs_update(&self, _old: SchemaVersion, _new: SchemaVersion) -> bool {
        false
    }

    fn update_statements(&self, _old: SchemaVersion, _new: SchemaVersion) -> Vec<String> {
        Vec::new()
    }

    fn delete_statements(&self) -> Vec<String> {
        vec!["DELETE FROM nowhere".into()]
    }

    fn initial_rows(&self, _target: SchemaVersion) -> Vec<String> {
        vec!["INSERT INTO stale (label) VALUES ('kept')".into()]
    }
}

#[derive(Deserialize)]
struct NewItem {
    name: String,
}

/// Handler over `items`, recording every callback.
///
/// `save` expects `{"name": .., "seq": ..}`; `read_all` captures the names in id order.
pub struct ItemsHandler {
    pub id: HandlerId,
    pub log: Arc<Mutex<Vec<String>>>,
    pub names: Arc<Mutex<Vec<String>>>,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub fail_saves: bool,
}

impl ItemsHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::with_id(Uuid::new_v4()))
    }

    pub fn with_id(id: HandlerId) -> Self {
        Self {
            id,
            log: Arc::new(Mutex::new(Vec::new())),
            names: Arc::new(Mutex::new(Vec::new())),
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            fail_saves: false,
        }
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_saves: true,
            ..Self::with_id(Uuid::new_v4())
        })
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.names.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl DataHandler for ItemsHandler {
    fn id(&self) -> HandlerId {
        self.id
    }

    async fn database_opened(&self, _conn: &mut SqliteConnection) -> Result<(), DbError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn database_closed(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }

    async fn save(&self, value: Value, conn: &mut SqliteConnection) -> Result<(), DbError> {
        self.record(format!("save:{}", value["seq"]));
        if self.fail_saves {
            return Err(DbError::Handler("save rejected".to_string()));
        }
        let item: NewItem = serde_json::from_value(value)?;
        sqlx::query("INSERT INTO items (name) VALUES (?)")
            .bind(item.name)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn update(&self, value: Value, conn: &mut SqliteConnection) -> Result<(), DbError> {
        self.record(format!("update:{}", value["seq"]));
        sqlx::query("UPDATE items SET name = ? WHERE id = ?")
            .bind(value["name"].as_str().unwrap_or_default().to_string())
            .bind(value["id"].as_i64().unwrap_or_default())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, value: Value, conn: &mut SqliteConnection) -> Result<(), DbError> {
        self.record(format!("delete:{}", value["seq"]));
        sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(value["id"].as_i64().unwrap_or_default())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn read_one(&self, value: Value, _conn: &mut SqliteConnection) -> Result<(), DbError> {
        self.record(format!("read_one:{}", value["seq"]));
        Ok(())
    }

    async fn read_all(&self, conn: &mut SqliteConnection) -> Result<(), DbError> {
        self.record("read_all".to_string());
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM items ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;
        *self.names.lock().unwrap() = names;
        Ok(())
    }
}

/// Handler that does nothing but exist.
pub struct NoopHandler(pub HandlerId);

#[async_trait]
impl DataHandler for NoopHandler {
    fn id(&self) -> HandlerId {
        self.0
    }
}

pub fn test_config() -> StoreConfig {
    StoreConfig {
        wal: false,
        ..StoreConfig::default()
    }
}

pub async fn spawn_in(dir: &Path, cfg: StoreConfig) -> DbDispatcher {
    DbDispatcher::spawn(cfg, Arc::new(DataDirResolver::new(dir)))
        .await
        .expect("dispatcher spawns")
}

/// Spawn a dispatcher, let `configure` add tables, then initialize `store.db` in `dir`.
pub async fn open_store(
    dir: &Path,
    version: SchemaVersion,
    configure: impl FnOnce(&DbDispatcher),
) -> (DbDispatcher, mpsc::UnboundedReceiver<DbEvent>) {
    let db = spawn_in(dir, test_config()).await;
    let events = db.subscribe();
    configure(&db);
    db.set_version(version).unwrap();
    db.initialize(STORE_FILE).unwrap();
    (db, events)
}

pub fn items_schema(db: &DbDispatcher) {
    db.add_table(ItemsTable);
}

pub async fn next_event(events: &mut mpsc::UnboundedReceiver<DbEvent>) -> DbEvent {
    tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("event within timeout")
        .expect("event channel open")
}

pub async fn expect_ready(events: &mut mpsc::UnboundedReceiver<DbEvent>) {
    match next_event(events).await {
        DbEvent::Ready => {}
        other => panic!("expected Ready, got {other:?}"),
    }
}

/// Everything already emitted, without waiting.
pub fn drain(events: &mut mpsc::UnboundedReceiver<DbEvent>) -> Vec<DbEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

pub fn store_path(dir: &Path) -> PathBuf {
    dir.join(STORE_FILE)
}

/// Independent connection for inspecting a closed store.
pub async fn inspect(dir: &Path) -> SqliteConnection {
    let opts = SqliteConnectOptions::new().filename(store_path(dir));
    SqliteConnection::connect_with(&opts)
        .await
        .expect("store file opens")
}

pub async fn stored_version(conn: &mut SqliteConnection) -> Vec<i64> {
    sqlx::query_scalar("SELECT majorversion FROM dbversion")
        .fetch_all(&mut *conn)
        .await
        .unwrap()
}

pub async fn item_names(conn: &mut SqliteConnection) -> Vec<String> {
    sqlx::query_scalar("SELECT name FROM items ORDER BY id")
        .fetch_all(&mut *conn)
        .await
        .unwrap()
}

pub async fn table_exists(conn: &mut SqliteConnection, table: &str) -> bool {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(&mut *conn)
            .await
            .unwrap();
    count > 0
}

/// Wait for `id`'s `ReadAllFinished`, failing on any error notification on the way.
pub async fn wait_read_all(events: &mut mpsc::UnboundedReceiver<DbEvent>, id: HandlerId) {
    loop {
        match next_event(events).await {
            DbEvent::ReadAllFinished(done) if done == id => return,
            DbEvent::Error { description, .. } => panic!("unexpected error: {description}"),
            _ => {}
        }
    }
}
