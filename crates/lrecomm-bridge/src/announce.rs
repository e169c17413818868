// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presence announces, heard and sent.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lrecomm_config::DiscoveredPeers;
use lrecomm_core::{Announce, LrecommError, MeshTransport, unix_now};
use lrecomm_storage::Identity;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::history::History;

/// Records announcing peers in the discovered-peers file and the identity table.
pub struct AnnounceHandler {
    discovered_path: PathBuf,
    history: History,
    // Serializes read-modify-write of the discovered-peers file.
    file_lock: Mutex<()>,
}

impl AnnounceHandler {
    pub fn new(discovered_path: impl Into<PathBuf>, history: History) -> Self {
        Self {
            discovered_path: discovered_path.into(),
            history,
            file_lock: Mutex::new(()),
        }
    }

    /// Remember the announcing peer. Returns its display name.
    pub async fn handle(&self, announce: &Announce) -> Result<String, LrecommError> {
        let name = announce.display_name();
        let seen_at = unix_now();
        info!(peer = %announce.destination.pretty(), name = %name, "announce heard");

        {
            let _guard = self.file_lock.lock().await;
            let mut peers = DiscoveredPeers::load(&self.discovered_path)?;
            peers.record(announce.destination, name.clone(), seen_at);
            peers.save(&self.discovered_path)?;
        }

        self.history
            .identity_seen(&Identity {
                destination: announce.destination.to_string(),
                identity_hash: announce.identity.clone(),
                name: name.clone(),
                username: None,
                last_seen: seen_at,
            })
            .await;
        Ok(name)
    }
}

/// Broadcast `display_name` every `interval` until cancelled.
pub async fn run_announce_loop(
    mesh: Arc<dyn MeshTransport>,
    display_name: String,
    interval: Duration,
    cancel: CancellationToken,
) {
    info!(interval = ?interval, name = %display_name, "announce loop started");
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match mesh.announce(&display_name).await {
                    Ok(()) => info!(name = %display_name, "announce sent"),
                    Err(e) => warn!(error = %e, "announce failed"),
                }
            }
            _ = cancel.cancelled() => {
                info!("announce loop shutting down");
                break;
            }
        }
    }
}
