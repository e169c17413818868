// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded peer path resolution.

use std::sync::Arc;
use std::time::Duration;

use lrecomm_core::{LrecommError, MeshTransport, PeerAddress, PeerIdentity};
use tokio::time::Instant;
use tracing::{debug, info};

/// Waits for the mesh to learn a path to a peer, up to a fixed timeout.
#[derive(Clone)]
pub struct PeerResolver {
    mesh: Arc<dyn MeshTransport>,
    timeout: Duration,
    poll_interval: Duration,
}

impl PeerResolver {
    pub fn new(mesh: Arc<dyn MeshTransport>, timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            mesh,
            timeout,
            poll_interval,
        }
    }

    pub fn mesh(&self) -> &Arc<dyn MeshTransport> {
        &self.mesh
    }

    /// Resolve `peer`, requesting a path if none is known.
    ///
    /// Fails with [`LrecommError::PeerUnreachable`] once the timeout elapses.
    pub async fn resolve(&self, peer: &PeerAddress) -> Result<PeerIdentity, LrecommError> {
        if self.mesh.has_path(peer).await {
            return Ok(self.recall(peer).await);
        }

        info!(peer = %peer.pretty(), "requesting path");
        self.mesh.request_path(peer).await?;

        let started = Instant::now();
        let deadline = started + self.timeout;
        loop {
            if self.mesh.has_path(peer).await {
                debug!(peer = %peer.pretty(), waited = ?started.elapsed(), "path found");
                return Ok(self.recall(peer).await);
            }
            if Instant::now() >= deadline {
                return Err(LrecommError::PeerUnreachable {
                    peer: peer.to_string(),
                    waited: started.elapsed(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn recall(&self, peer: &PeerAddress) -> PeerIdentity {
        self.mesh
            .recall_identity(peer)
            .await
            .unwrap_or(PeerIdentity {
                destination: *peer,
                identity_hash: None,
            })
    }
}
