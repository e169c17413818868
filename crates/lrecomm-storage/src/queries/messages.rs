// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat history.

use lrecomm_core::{LrecommError, PeerAddress};
use rusqlite::params;

use crate::database::Database;
use crate::models::ChatLine;

/// Record a text message sent to `receiver`.
pub async fn log_sent(
    db: &Database,
    receiver: &PeerAddress,
    content: &str,
    time: i64,
) -> Result<i64, LrecommError> {
    insert(db, "msg_sent", "receiver_hash", receiver, content, time).await
}

/// Record a text message received from `sender`.
pub async fn log_received(
    db: &Database,
    sender: &PeerAddress,
    content: &str,
    time: i64,
) -> Result<i64, LrecommError> {
    insert(db, "msg_recv", "sender_hash", sender, content, time).await
}

async fn insert(
    db: &Database,
    table: &'static str,
    peer_column: &'static str,
    peer: &PeerAddress,
    content: &str,
    time: i64,
) -> Result<i64, LrecommError> {
    let peer = peer.to_string();
    let content = content.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                &format!("INSERT INTO {table} ({peer_column}, content, time) VALUES (?1, ?2, ?3)"),
                params![peer, content, time],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Both directions of the conversation with `peer`, oldest first.
pub async fn conversation(db: &Database, peer: &PeerAddress) -> Result<Vec<ChatLine>, LrecommError> {
    let peer = peer.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT content, time, 1 AS outgoing, id FROM msg_sent WHERE receiver_hash = ?1
                 UNION ALL
                 SELECT content, time, 0 AS outgoing, id FROM msg_recv WHERE sender_hash = ?1
                 ORDER BY time ASC, outgoing ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![peer], |row| {
                Ok(ChatLine {
                    content: row.get(0)?,
                    time: row.get(1)?,
                    outgoing: row.get(2)?,
                })
            })?;
            let mut lines = Vec::new();
            for row in rows {
                lines.push(row?);
            }
            Ok(lines)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
