//! Connection pool and schema for the backing SQLite database
//!
//! The database is the authoritative truth for the folder hierarchy and the
//! message store. Everything else in this crate (the in-memory folder
//! mirror, filter snapshots) is a cache over these tables.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use crate::error::MailviewError;

/// Database connection pool type
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Handle to the folders/messages database
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MailviewError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(5).build(manager)?;

        let db = Self { pool };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    ///
    /// The pool is pinned to a single connection: every in-memory SQLite
    /// connection is its own database.
    pub fn in_memory() -> Result<Self, MailviewError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;

        let db = Self { pool };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Get a connection from the pool
    pub(crate) fn connection(&self) -> Result<DbConnection, MailviewError> {
        Ok(self.pool.get()?)
    }

    fn initialize_schema(&self) -> Result<(), MailviewError> {
        let conn = self.connection()?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;

            -- Folder hierarchy, nested-set encoded. A folder's subtree is
            -- every row whose interval nests inside its [lft, rgt].
            CREATE TABLE IF NOT EXISTS folders (
                id      INTEGER PRIMARY KEY,
                name    TEXT NOT NULL,
                lft     INTEGER NOT NULL,
                rgt     INTEGER NOT NULL,
                flags   INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_folders_lft ON folders(lft);

            -- Message rows referenced by filters
            CREATE TABLE IF NOT EXISTS messages (
                id              INTEGER PRIMARY KEY,
                message_id      TEXT,               -- RFC 5322 Message-ID header
                date            INTEGER,            -- unix epoch ms
                from_address    TEXT,
                subject         TEXT,
                folder          INTEGER NOT NULL REFERENCES folders(id),
                flags           INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_messages_folder ON messages(folder);
            CREATE INDEX IF NOT EXISTS idx_messages_flags  ON messages(flags);
            "#,
        )?;

        Ok(())
    }
}
