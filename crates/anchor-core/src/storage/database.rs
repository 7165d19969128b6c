//! SQLite storage for the offline backend.
//!
//! Provides persistent storage for:
//! - User profiles and check-ins (mirroring the hosted tables)
//! - Key-value store for client-side state such as chat history

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection};

use super::data_dir;
use crate::error::GatewayError;

/// SQLite database handle.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Mutable access, needed to open a transaction.
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Open the database at `~/.config/anchor/anchor.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, GatewayError> {
        let dir = data_dir().map_err(|e| GatewayError::QueryFailed(e.to_string()))?;
        Self::open_at(&dir.join("anchor.db"))
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, GatewayError> {
        let conn = Connection::open(path).map_err(|source| GatewayError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        // Several CLI processes may share the file.
        conn.busy_timeout(Duration::from_secs(5))?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, GatewayError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS user_profiles (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                streak          INTEGER NOT NULL DEFAULT 0,
                total_check_ins INTEGER NOT NULL DEFAULT 0,
                level           INTEGER NOT NULL DEFAULT 1,
                experience      INTEGER NOT NULL DEFAULT 0,
                badges          TEXT NOT NULL DEFAULT '[]',
                last_check_in   TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS check_ins (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id    TEXT NOT NULL,
                mood       INTEGER NOT NULL,
                energy     INTEGER NOT NULL,
                stress     INTEGER NOT NULL,
                note       TEXT,
                date       TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_check_ins_user_date ON check_ins(user_id, date);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}
