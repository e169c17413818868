// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection lifecycle: open, PRAGMA setup, migrations, checkpoint on close.
//!
//! Every statement runs on tokio-rusqlite's background thread, so writes from
//! the poller, the inbound handler, and the chat console are serialized.

use std::path::Path;

use lrecomm_core::LrecommError;
use tracing::{debug, info};

pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> LrecommError {
    LrecommError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the history database. Clones share one connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (creating if needed) the database at `path` and migrate it.
    pub async fn open(path: &str) -> Result<Self, LrecommError> {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| LrecommError::io("create database directory", parent, e))?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| LrecommError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare().await?;
        info!(path, "database opened");
        Ok(db)
    }

    /// In-memory database with the full schema.
    pub async fn open_in_memory() -> Result<Self, LrecommError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| LrecommError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare().await?;
        Ok(db)
    }

    async fn prepare(&self) -> Result<(), LrecommError> {
        self.conn
            .call(|conn| -> Result<(), LrecommError> {
                conn.execute_batch(
                    "PRAGMA journal_mode = WAL;
                     PRAGMA synchronous = NORMAL;
                     PRAGMA busy_timeout = 5000;
                     PRAGMA foreign_keys = ON;",
                )
                .map_err(|e| LrecommError::Storage {
                    source: Box::new(e),
                })?;
                crate::migrations::run_migrations(conn)
            })
            .await
            .map_err(|e| LrecommError::Storage {
                source: e.to_string().into(),
            })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), LrecommError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        self.conn.close().await.map_err(map_tr_err)?;
        info!("database closed");
        Ok(())
    }
}
