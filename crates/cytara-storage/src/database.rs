// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread: `Database` wraps one `tokio_rusqlite::Connection`, every query
//! module accepts `&Database` and calls through `connection().call()`. Do
//! NOT create additional Connection instances for writes.

use cytara_core::CytaraError;
use tracing::debug;

/// Handle to the single-writer SQLite database.
///
/// Opening runs all pending migrations; the handle is cheap to share by
/// reference across services.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode, configure
    /// pragmas, and run embedded migrations.
    pub async fn open(path: &str) -> Result<Self, CytaraError> {
        Self::open_with_wal(path, true).await
    }

    /// Like [`open`](Self::open) with an explicit journal mode.
    /// `wal_mode = false` keeps SQLite's rollback journal, for storage on
    /// filesystems where WAL is unavailable.
    pub async fn open_with_wal(path: &str, wal_mode: bool) -> Result<Self, CytaraError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| CytaraError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| {
            let journal_mode = if wal_mode { "WAL" } else { "DELETE" };
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = {journal_mode};
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;"
            ))?;
            crate::migrations::run_migrations(conn)
                .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened, migrations applied");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), CytaraError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into the workspace storage error.
pub fn map_tr_err(err: tokio_rusqlite::Error) -> CytaraError {
    CytaraError::Storage {
        source: Box::new(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_database_file_and_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("open.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        assert!(db_path.exists());

        // Migrations created the core tables.
        let tables: Vec<String> = db
            .connection()
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                Ok::<_, rusqlite::Error>(names)
            })
            .await
            .unwrap();

        for expected in [
            "personas",
            "persona_identities",
            "submissions",
            "quotes",
            "moderation_actions",
            "bots",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}");
        }

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn journal_mode_follows_the_wal_flag() {
        let dir = tempdir().unwrap();

        for (wal, expected) in [(true, "wal"), (false, "delete")] {
            let db_path = dir.path().join(format!("journal-{expected}.db"));
            let db = Database::open_with_wal(db_path.to_str().unwrap(), wal)
                .await
                .unwrap();
            let mode: String = db
                .connection()
                .call(|conn| {
                    let mode = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
                    Ok::<_, rusqlite::Error>(mode)
                })
                .await
                .unwrap();
            assert_eq!(mode.to_lowercase(), expected);
            db.close().await.unwrap();
        }
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
        // Second open must not fail on already-applied migrations.
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
    }
}
