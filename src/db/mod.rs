//! Durable key-value storage on SQLite.
//!
//! This module provides the on-disk store behind the journal: a single `kv`
//! table accessed through an r2d2 connection pool. It is the CLI's counterpart
//! of a browser's origin-scoped durable storage, private to one data directory.
//!
//! # Module Structure
//!
//! - `schema`: Table definitions and schema initialization
//!
//! # Example
//!
//! ```no_run
//! use devotions::db::Database;
//! use devotions::store::KeyValueStore;
//! use std::path::Path;
//!
//! let db = Database::open(Path::new("/tmp/devotions.db"))?;
//! db.set("devotions-mood-2024-03-05", "baseline")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod schema;

use crate::errors::{AppResult, StorageError};
use crate::store::{KeyValueStore, StoreResult};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

/// Type alias for a pooled SQLite connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Database handle with connection pooling.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Opens or creates the database and makes sure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Database file cannot be opened or is not a SQLite database
    /// - Connection pool cannot be initialized
    /// - Schema creation fails
    pub fn open(db_path: &Path) -> AppResult<Self> {
        debug!("Opening database at: {:?}", db_path);

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(2)
            .build(manager)
            .map_err(StorageError::Pool)?;

        let db = Database { pool };
        db.initialize_schema()?;

        info!("Database opened successfully");
        Ok(db)
    }

    /// Gets a connection from the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection is available or the pool is exhausted.
    pub fn get_conn(&self) -> StoreResult<PooledConnection> {
        self.pool.get().map_err(StorageError::Pool)
    }

    /// Creates all tables if they don't exist. Idempotent.
    pub fn initialize_schema(&self) -> AppResult<()> {
        let conn = self.get_conn()?;
        schema::create_tables(&conn)?;
        Ok(())
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        debug!("Writing key {}", key);
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM kv ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(String, String)>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_file_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("devotions.db");

        let db = Database::open(&path).unwrap();
        assert!(path.exists());

        let conn = db.get_conn().unwrap();
        assert_eq!(
            schema::get_schema_version(&conn).unwrap(),
            Some(schema::SCHEMA_VERSION)
        );
    }

    #[test]
    fn test_set_get_overwrite() {
        let dir = tempdir().unwrap();
        let db = Database::open(&dir.path().join("devotions.db")).unwrap();

        assert!(db.get("devotions-vent-2024-03-05").unwrap().is_none());
        db.set("devotions-vent-2024-03-05", "first").unwrap();
        db.set("devotions-vent-2024-03-05", "second").unwrap();
        assert_eq!(
            db.get("devotions-vent-2024-03-05").unwrap().as_deref(),
            Some("second")
        );
    }

    #[test]
    fn test_values_persist_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("devotions.db");
        {
            let db = Database::open(&path).unwrap();
            db.set("devotions-psalm-23", r#"{"prayer":"p","reflection":"r"}"#)
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let entries = db.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "devotions-psalm-23");
    }

    #[test]
    fn test_remove_and_sorted_entries() {
        let dir = tempdir().unwrap();
        let db = Database::open(&dir.path().join("devotions.db")).unwrap();
        db.set("devotions-vent-2024-01-02", "b").unwrap();
        db.set("devotions-mood-2024-01-01", "mania").unwrap();
        db.set("devotions-pin-hash", "abc").unwrap();
        db.remove("devotions-pin-hash").unwrap();
        db.remove("devotions-pin-hash").unwrap();

        let keys: Vec<String> = db.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["devotions-mood-2024-01-01", "devotions-vent-2024-01-02"]
        );
    }

    #[test]
    fn test_open_rejects_non_database_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("devotions.db");
        std::fs::write(&path, b"this is definitely not a sqlite database file, not at all").unwrap();

        assert!(Database::open(&path).is_err());
    }
}
