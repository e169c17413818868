// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File transfer log.

use lrecomm_core::{LrecommError, PeerAddress};
use rusqlite::params;

use crate::database::Database;
use crate::models::{Direction, FileRecord};

fn table_for(direction: Direction) -> (&'static str, &'static str) {
    match direction {
        Direction::Sent => ("file_sent", "receiver_hash"),
        Direction::Received => ("file_recv", "sender_hash"),
    }
}

/// Record a file transfer. `peer` is the receiver for sent files and the sender otherwise.
pub async fn log_file(
    db: &Database,
    direction: Direction,
    peer: &PeerAddress,
    file_path: &str,
    time: i64,
) -> Result<i64, LrecommError> {
    let (table, peer_column) = table_for(direction);
    let peer = peer.to_string();
    let file_path = file_path.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                &format!("INSERT INTO {table} ({peer_column}, file_path, time) VALUES (?1, ?2, ?3)"),
                params![peer, file_path, time],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Every file transfer in one direction, oldest first.
pub async fn list(db: &Database, direction: Direction) -> Result<Vec<FileRecord>, LrecommError> {
    let (table, peer_column) = table_for(direction);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, {peer_column}, file_path, time FROM {table} ORDER BY time ASC, id ASC"
            ))?;
            let rows = stmt.query_map([], |row| {
                Ok(FileRecord {
                    id: row.get(0)?,
                    direction,
                    peer: row.get(1)?,
                    file_path: row.get(2)?,
                    time: row.get(3)?,
                })
            })?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
