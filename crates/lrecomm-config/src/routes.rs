// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mailbox route table and discovered-peer registry.
//!
//! The route table is a JSON object mapping mailbox ids to peer addresses.
//! [`RouteStore`] holds the current immutable snapshot behind an `ArcSwap`;
//! readers never lock and a reload replaces the whole table at once.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use lrecomm_core::{LrecommError, MailboxId, PeerAddress};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Immutable mailbox → peer mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: BTreeMap<MailboxId, PeerAddress>,
}

impl RouteTable {
    /// Parse a route table, skipping entries whose address is not valid hex.
    pub fn from_json(text: &str) -> Result<Self, LrecommError> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(text)
            .map_err(|e| LrecommError::Config(format!("route table is not a JSON object: {e}")))?;

        let mut routes = BTreeMap::new();
        for (mailbox, value) in raw {
            let Some(text) = value.as_str() else {
                warn!(mailbox = %mailbox, "route entry is not a string, skipping");
                continue;
            };
            match text.parse::<PeerAddress>() {
                Ok(peer) => {
                    routes.insert(MailboxId::from(mailbox.as_str()), peer);
                }
                Err(e) => warn!(mailbox = %mailbox, error = %e, "invalid route address, skipping"),
            }
        }
        Ok(Self { routes })
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (MailboxId, PeerAddress)>) -> Self {
        Self {
            routes: pairs.into_iter().collect(),
        }
    }

    pub fn peer_for(&self, mailbox: &MailboxId) -> Option<PeerAddress> {
        self.routes.get(mailbox).copied()
    }

    /// Reverse lookup. Addresses are compared as bytes, so hex case never matters.
    pub fn mailbox_for(&self, peer: &PeerAddress) -> Option<&MailboxId> {
        self.routes
            .iter()
            .find_map(|(mailbox, p)| (p == peer).then_some(mailbox))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MailboxId, &PeerAddress)> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn to_json(&self) -> Result<String, LrecommError> {
        let raw: BTreeMap<&str, String> = self
            .routes
            .iter()
            .map(|(m, p)| (m.as_str(), p.to_string()))
            .collect();
        serde_json::to_string_pretty(&raw)
            .map_err(|e| LrecommError::Internal(format!("route table serialization: {e}")))
    }
}

fn read_table(path: &Path) -> Result<RouteTable, LrecommError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| LrecommError::io("read route table", path, e))?;
    RouteTable::from_json(&text)
}

/// Hot-reloadable holder of the current [`RouteTable`].
#[derive(Debug)]
pub struct RouteStore {
    path: PathBuf,
    current: ArcSwap<RouteTable>,
}

impl RouteStore {
    /// Load the table at `path`. A missing or broken file yields an empty table.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let store = Self {
            path: path.into(),
            current: ArcSwap::from_pointee(RouteTable::default()),
        };
        if store.reload().is_err() {
            debug!(path = %store.path.display(), "starting with an empty route table");
        }
        store
    }

    /// A store that is never backed by a file; used by embedders and tests.
    pub fn fixed(path: impl Into<PathBuf>, table: RouteTable) -> Self {
        Self {
            path: path.into(),
            current: ArcSwap::from_pointee(table),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.current.load_full()
    }

    /// Re-read the file and swap in a new snapshot.
    ///
    /// On failure the empty table is published and the error returned, so
    /// every lookup afterwards misses instead of using stale routes.
    pub fn reload(&self) -> Result<Arc<RouteTable>, LrecommError> {
        match read_table(&self.path) {
            Ok(table) => {
                info!(path = %self.path.display(), routes = table.len(), "route table loaded");
                let table = Arc::new(table);
                self.current.store(Arc::clone(&table));
                Ok(table)
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "route table unavailable, using empty table");
                self.current.store(Arc::new(RouteTable::default()));
                Err(e)
            }
        }
    }

    /// Map `mailbox` to `peer`, rewrite the file, and reload.
    pub fn assign(&self, mailbox: MailboxId, peer: PeerAddress) -> Result<Arc<RouteTable>, LrecommError> {
        let mut routes = match read_table(&self.path) {
            Ok(table) => table.routes,
            Err(e) => {
                debug!(error = %e, "starting a new route table");
                BTreeMap::new()
            }
        };
        routes.insert(mailbox.clone(), peer);
        let json = RouteTable { routes }.to_json()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| LrecommError::io("create directory", parent, e))?;
        }
        std::fs::write(&self.path, json)
            .map_err(|e| LrecommError::io("write route table", &self.path, e))?;
        info!(mailbox = %mailbox, peer = %peer, "route assigned");
        self.reload()
    }
}

/// One peer heard in an announce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredPeer {
    pub name: String,
    pub last_seen: i64,
}

/// Peers heard on the network, keyed by address, persisted as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscoveredPeers(BTreeMap<PeerAddress, DiscoveredPeer>);

impl DiscoveredPeers {
    /// Read the registry. A missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self, LrecommError> {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                LrecommError::Config(format!("{} is not a peer registry: {e}", path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(LrecommError::io("read peer registry", path, e)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), LrecommError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LrecommError::Internal(format!("peer registry serialization: {e}")))?;
        std::fs::write(path, json).map_err(|e| LrecommError::io("write peer registry", path, e))
    }

    pub fn record(&mut self, peer: PeerAddress, name: impl Into<String>, seen_at: i64) {
        self.0.insert(
            peer,
            DiscoveredPeer {
                name: name.into(),
                last_seen: seen_at,
            },
        );
    }

    pub fn get(&self, peer: &PeerAddress) -> Option<&DiscoveredPeer> {
        self.0.get(peer)
    }

    /// Entries ordered by address, which gives the operator menu stable numbering.
    pub fn iter(&self) -> impl Iterator<Item = (&PeerAddress, &DiscoveredPeer)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    const A: &str = "0123456789abcdef0123456789abcdef";
    const B: &str = "fedcba9876543210fedcba9876543210";

    #[test]
    fn invalid_entries_are_skipped() {
        let json = format!(r#"{{"6001": "{A}", "6002": "nothex", "6003": 5}}"#);
        let table = RouteTable::from_json(&json).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.peer_for(&MailboxId::from("6001")),
            Some(A.parse().unwrap())
        );
    }

    #[test]
    fn reverse_lookup_ignores_hex_case() {
        let json = format!(r#"{{"6001": "{}"}}"#, A.to_uppercase());
        let table = RouteTable::from_json(&json).unwrap();
        let peer: PeerAddress = A.parse().unwrap();
        assert_eq!(table.mailbox_for(&peer).map(|m| m.as_str()), Some("6001"));
    }

    #[test]
    #[traced_test]
    fn missing_file_gives_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = RouteStore::load(dir.path().join("absent.json"));
        assert!(store.snapshot().is_empty());
        assert!(logs_contain("starting with an empty route table"));
    }

    #[test]
    fn reload_swaps_snapshot_and_old_snapshot_survives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.json");
        std::fs::write(&path, format!(r#"{{"6001": "{A}"}}"#)).unwrap();
        let store = RouteStore::load(&path);
        let before = store.snapshot();

        std::fs::write(&path, format!(r#"{{"6001": "{B}", "6002": "{A}"}}"#)).unwrap();
        let after = store.reload().unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn broken_file_publishes_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.json");
        std::fs::write(&path, format!(r#"{{"6001": "{A}"}}"#)).unwrap();
        let store = RouteStore::load(&path);
        std::fs::write(&path, "not json").unwrap();

        assert!(store.reload().is_err());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn assign_writes_file_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.json");
        let store = RouteStore::load(&path);

        store
            .assign(MailboxId::from("6001"), B.parse().unwrap())
            .unwrap();

        let on_disk = RouteTable::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(
            store.snapshot().peer_for(&MailboxId::from("6001")),
            Some(B.parse().unwrap())
        );
    }

    #[test]
    fn discovered_peers_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("peers.json");
        let mut peers = DiscoveredPeers::load(&path).unwrap();
        assert!(peers.is_empty());

        let peer: PeerAddress = A.parse().unwrap();
        peers.record(peer, "Base", 100);
        peers.record(peer, "Base Camp", 200);
        peers.save(&path).unwrap();

        let loaded = DiscoveredPeers::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(&peer).unwrap().name, "Base Camp");
        assert_eq!(loaded.get(&peer).unwrap().last_seen, 200);
    }
}
