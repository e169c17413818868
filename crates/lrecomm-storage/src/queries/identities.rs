// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Known peers.

use lrecomm_core::LrecommError;
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::models::Identity;

const COLUMNS: &str = "destination, identity_hash, name, username, last_seen";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Identity> {
    Ok(Identity {
        destination: row.get(0)?,
        identity_hash: row.get(1)?,
        name: row.get(2)?,
        username: row.get(3)?,
        last_seen: row.get(4)?,
    })
}

/// Insert or refresh a peer. A missing identity hash or username keeps the stored one.
pub async fn upsert_identity(db: &Database, identity: &Identity) -> Result<(), LrecommError> {
    let identity = identity.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO identity (destination, identity_hash, name, username, last_seen)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(destination) DO UPDATE SET
                    identity_hash = COALESCE(excluded.identity_hash, identity.identity_hash),
                    name = excluded.name,
                    username = COALESCE(excluded.username, identity.username),
                    last_seen = excluded.last_seen",
                params![
                    identity.destination,
                    identity.identity_hash,
                    identity.name,
                    identity.username,
                    identity.last_seen,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_identity(db: &Database, destination: &str) -> Result<Option<Identity>, LrecommError> {
    let destination = destination.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {COLUMNS} FROM identity WHERE destination = ?1");
            Ok(conn.query_row(&sql, params![destination], from_row).optional()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Most recently heard peer announcing `name`, compared case-insensitively.
pub async fn find_by_name(db: &Database, name: &str) -> Result<Option<Identity>, LrecommError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {COLUMNS} FROM identity WHERE name = ?1 COLLATE NOCASE
                 ORDER BY last_seen DESC LIMIT 1"
            );
            Ok(conn.query_row(&sql, params![name], from_row).optional()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All peers, ordered by name.
pub async fn list_identities(db: &Database) -> Result<Vec<Identity>, LrecommError> {
    db.connection()
        .call(|conn| {
            let sql = format!("SELECT {COLUMNS} FROM identity ORDER BY name COLLATE NOCASE, destination");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], from_row)?;
            let mut identities = Vec::new();
            for row in rows {
                identities.push(row?);
            }
            Ok(identities)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(destination: &str, name: &str, last_seen: i64) -> Identity {
        Identity {
            destination: destination.to_string(),
            identity_hash: Some(format!("id-{destination}")),
            name: name.to_string(),
            username: None,
            last_seen,
        }
    }

    #[tokio::test]
    async fn upsert_refreshes_name_and_keeps_identity_hash() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_identity(&db, &peer("aa", "Alpha", 10)).await.unwrap();

        let mut renamed = peer("aa", "Alpha Base", 20);
        renamed.identity_hash = None;
        upsert_identity(&db, &renamed).await.unwrap();

        let stored = get_identity(&db, "aa").await.unwrap().unwrap();
        assert_eq!(stored.name, "Alpha Base");
        assert_eq!(stored.identity_hash.as_deref(), Some("id-aa"));
        assert_eq!(stored.last_seen, 20);
        assert_eq!(list_identities(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_identity(&db, &peer("bb", "zulu", 1)).await.unwrap();
        upsert_identity(&db, &peer("cc", "Bravo", 1)).await.unwrap();
        upsert_identity(&db, &peer("dd", "alpha", 1)).await.unwrap();

        let names: Vec<String> = list_identities(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, ["alpha", "Bravo", "zulu"]);
    }

    #[tokio::test]
    async fn find_by_name_prefers_latest() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_identity(&db, &peer("aa", "Relay", 5)).await.unwrap();
        upsert_identity(&db, &peer("bb", "relay", 9)).await.unwrap();

        let found = find_by_name(&db, "RELAY").await.unwrap().unwrap();
        assert_eq!(found.destination, "bb");
        assert!(find_by_name(&db, "nobody").await.unwrap().is_none());
    }
}
