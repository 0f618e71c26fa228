//! SQLite-backed access records
//!
//! Schema:
//! ```sql
//! CREATE TABLE IF NOT EXISTS access_records (
//!     identity    TEXT PRIMARY KEY,
//!     unlocked    INTEGER NOT NULL,
//!     updated_at  INTEGER NOT NULL
//! )
//! ```
//!
//! Each lookup queries the database directly (no caching), so a record
//! written by another process is visible immediately.

use {
    super::{store::AccessStore, AccessError},
    async_trait::async_trait,
    rusqlite::{Connection, OptionalExtension},
    std::{
        path::Path,
        sync::{Arc, Mutex, MutexGuard},
    },
};

/// Thread-safe SQLite connection wrapper for access records
#[derive(Debug, Clone)]
pub struct SqliteAccessStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAccessStore {
    /// Open (or create) the database at `db_path` and ensure the table exists
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, AccessError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self, AccessError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, AccessError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS access_records (
                identity    TEXT PRIMARY KEY,
                unlocked    INTEGER NOT NULL,
                updated_at  INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AccessError> {
        self.conn
            .lock()
            .map_err(|_| AccessError::Store("access database lock poisoned".to_string()))
    }
}

#[async_trait]
impl AccessStore for SqliteAccessStore {
    async fn get(&self, key: &str) -> Result<Option<bool>, AccessError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached("SELECT unlocked FROM access_records WHERE identity = ?")?;
        let unlocked = stmt
            .query_row(rusqlite::params![key], |row| row.get::<_, bool>(0))
            .optional()?;
        Ok(unlocked)
    }

    async fn set(&self, key: &str, unlocked: bool) -> Result<(), AccessError> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO access_records (identity, unlocked, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(identity) DO UPDATE SET unlocked = excluded.unlocked, updated_at = excluded.updated_at",
            rusqlite::params![key, unlocked, now],
        )?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "sqlite"
    }
}
