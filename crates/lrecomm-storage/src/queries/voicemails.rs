// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voicemail transfer log.

use lrecomm_core::{LrecommError, PeerAddress};
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::models::{Direction, VoicemailRecord};

fn sent_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<VoicemailRecord> {
    Ok(VoicemailRecord {
        id: row.get(0)?,
        direction: Direction::Sent,
        peer: row.get(1)?,
        wav_path: row.get(2)?,
        time: row.get(3)?,
        unread: false,
    })
}

fn received_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<VoicemailRecord> {
    Ok(VoicemailRecord {
        id: row.get(0)?,
        direction: Direction::Received,
        peer: row.get(1)?,
        wav_path: row.get(2)?,
        time: row.get(3)?,
        unread: row.get(4)?,
    })
}

/// Record a voicemail delivered to `receiver`.
pub async fn log_sent(
    db: &Database,
    receiver: &PeerAddress,
    wav_path: &str,
    time: i64,
) -> Result<i64, LrecommError> {
    let receiver = receiver.to_string();
    let wav_path = wav_path.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO vm_sent (receiver_hash, wav_path, time) VALUES (?1, ?2, ?3)",
                params![receiver, wav_path, time],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record a voicemail received from `sender`. New entries start unread.
pub async fn log_received(
    db: &Database,
    sender: &PeerAddress,
    wav_path: &str,
    time: i64,
) -> Result<i64, LrecommError> {
    let sender = sender.to_string();
    let wav_path = wav_path.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO vm_recv (sender_hash, wav_path, time, unread) VALUES (?1, ?2, ?3, 1)",
                params![sender, wav_path, time],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// A received voicemail by id.
pub async fn get_received(db: &Database, id: i64) -> Result<Option<VoicemailRecord>, LrecommError> {
    db.connection()
        .call(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT vm_id, sender_hash, wav_path, time, unread FROM vm_recv WHERE vm_id = ?1",
                    params![id],
                    received_row,
                )
                .optional()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Every voicemail in one direction, oldest first.
pub async fn list(db: &Database, direction: Direction) -> Result<Vec<VoicemailRecord>, LrecommError> {
    db.connection()
        .call(move |conn| {
            let mut records = Vec::new();
            match direction {
                Direction::Sent => {
                    let mut stmt = conn.prepare(
                        "SELECT vm_id, receiver_hash, wav_path, time FROM vm_sent ORDER BY time ASC, vm_id ASC",
                    )?;
                    for row in stmt.query_map([], sent_row)? {
                        records.push(row?);
                    }
                }
                Direction::Received => {
                    let mut stmt = conn.prepare(
                        "SELECT vm_id, sender_hash, wav_path, time, unread FROM vm_recv
                         ORDER BY time ASC, vm_id ASC",
                    )?;
                    for row in stmt.query_map([], received_row)? {
                        records.push(row?);
                    }
                }
            }
            Ok(records)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Received voicemails not yet played, oldest first.
pub async fn unread(db: &Database) -> Result<Vec<VoicemailRecord>, LrecommError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT vm_id, sender_hash, wav_path, time, unread FROM vm_recv
                 WHERE unread = 1 ORDER BY time ASC, vm_id ASC",
            )?;
            let mut records = Vec::new();
            for row in stmt.query_map([], received_row)? {
                records.push(row?);
            }
            Ok(records)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a received voicemail as played. False if no such id.
pub async fn mark_read(db: &Database, id: i64) -> Result<bool, LrecommError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("UPDATE vm_recv SET unread = 0 WHERE vm_id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
