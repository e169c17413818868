// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mesh transport over a directory shared with the mesh daemon.
//!
//! ```text
//! <dir>/identity                 this node's address (read)
//! <dir>/paths/<hex>              known path, optional identity hash (read)
//! <dir>/requests/<hex>           path request (write)
//! <dir>/outbound/<ts>-<id>.json  submitted message (write)
//! <dir>/announce/<ts>-<id>.json  announce request (write)
//! <dir>/inbound/*.json           messages and announces (read, then delete)
//! <dir>/inbound/failed/          envelopes that could not be read or parsed
//! ```
//!
//! Every write lands under a `.tmp` name first and is renamed into place,
//! so the daemon never sees a partial file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lrecomm_core::{
    LrecommError, MeshEvent, MeshTransport, OutboundMessage, PeerAddress, PeerIdentity, unix_now,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const SUBDIRS: [&str; 5] = ["paths", "requests", "outbound", "announce", "inbound"];

/// Announce request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnounceRequest {
    pub display_name: String,
    pub requested_at: i64,
}

#[derive(Debug, Clone)]
pub struct HandoffTransport {
    dir: PathBuf,
    local: PeerAddress,
}

impl HandoffTransport {
    /// Open the handoff directory, creating its subdirectories. The
    /// `identity` file must already have been written by the daemon.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, LrecommError> {
        let dir = dir.into();
        for sub in SUBDIRS {
            let path = dir.join(sub);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|e| LrecommError::io("create directory", &path, e))?;
        }

        let identity_path = dir.join("identity");
        let text = tokio::fs::read_to_string(&identity_path)
            .await
            .map_err(|e| LrecommError::Transport {
                message: format!("mesh identity not readable at {}", identity_path.display()),
                source: Some(Box::new(e)),
            })?;
        let local: PeerAddress = text.parse()?;
        info!(address = %local.pretty(), dir = %dir.display(), "mesh handoff directory opened");
        Ok(Self { dir, local })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn envelope_name() -> String {
        format!("{}-{}.json", unix_now(), uuid::Uuid::new_v4())
    }

    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), LrecommError> {
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| LrecommError::io("write", &tmp, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| LrecommError::io("publish", path, e))
    }

    async fn write_json<T: Serialize>(&self, sub: &str, value: &T) -> Result<PathBuf, LrecommError> {
        let json = serde_json::to_vec_pretty(value).map_err(|e| LrecommError::Transport {
            message: "failed to encode envelope".into(),
            source: Some(Box::new(e)),
        })?;
        let path = self.dir.join(sub).join(Self::envelope_name());
        self.write_atomic(&path, &json).await?;
        Ok(path)
    }

    async fn next_inbound_file(&self) -> Result<Option<PathBuf>, LrecommError> {
        let inbound = self.dir.join("inbound");
        let mut entries = tokio::fs::read_dir(&inbound)
            .await
            .map_err(|e| LrecommError::io("list", &inbound, e))?;
        let mut oldest: Option<PathBuf> = None;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LrecommError::io("list", &inbound, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && oldest.as_ref().is_none_or(|o| path < *o)
            {
                oldest = Some(path);
            }
        }
        Ok(oldest)
    }

    /// Move an envelope that cannot be consumed into `inbound/failed/`.
    async fn quarantine(&self, path: &Path) {
        let failed = self.dir.join("inbound").join("failed");
        if let Err(e) = tokio::fs::create_dir_all(&failed).await {
            warn!(dir = %failed.display(), error = %e, "failed to create quarantine directory");
            return;
        }
        let Some(name) = path.file_name() else {
            return;
        };
        let target = failed.join(format!("{}-{}", unix_now(), name.to_string_lossy()));
        match tokio::fs::rename(path, &target).await {
            Ok(()) => warn!(file = %path.display(), moved_to = %target.display(), "inbound envelope quarantined"),
            Err(e) => warn!(file = %path.display(), error = %e, "failed to quarantine inbound envelope"),
        }
    }
}

#[async_trait]
impl MeshTransport for HandoffTransport {
    fn local_address(&self) -> PeerAddress {
        self.local
    }

    async fn has_path(&self, peer: &PeerAddress) -> bool {
        tokio::fs::try_exists(self.dir.join("paths").join(peer.to_string()))
            .await
            .unwrap_or(false)
    }

    async fn request_path(&self, peer: &PeerAddress) -> Result<(), LrecommError> {
        let path = self.dir.join("requests").join(peer.to_string());
        self.write_atomic(&path, unix_now().to_string().as_bytes()).await?;
        debug!(peer = %peer.pretty(), "path request written");
        Ok(())
    }

    async fn recall_identity(&self, peer: &PeerAddress) -> Option<PeerIdentity> {
        let text = tokio::fs::read_to_string(self.dir.join("paths").join(peer.to_string()))
            .await
            .ok()?;
        let hash = text.trim();
        Some(PeerIdentity {
            destination: *peer,
            identity_hash: (!hash.is_empty()).then(|| hash.to_string()),
        })
    }

    async fn submit(&self, message: OutboundMessage) -> Result<(), LrecommError> {
        let path = self.write_json("outbound", &message).await?;
        debug!(to = %message.destination.pretty(), file = %path.display(), "message handed off");
        Ok(())
    }

    async fn announce(&self, display_name: &str) -> Result<(), LrecommError> {
        let request = AnnounceRequest {
            display_name: display_name.to_string(),
            requested_at: unix_now(),
        };
        self.write_json("announce", &request).await?;
        Ok(())
    }

    async fn poll_inbound(&self) -> Result<Option<MeshEvent>, LrecommError> {
        let Some(path) = self.next_inbound_file().await? else {
            return Ok(None);
        };
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.quarantine(&path).await;
                return Err(LrecommError::io("read", &path, e));
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(event) => {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!(file = %path.display(), error = %e, "failed to remove inbound envelope");
                }
                Ok(Some(event))
            }
            Err(e) => {
                self.quarantine(&path).await;
                Err(LrecommError::Transport {
                    message: format!("malformed inbound envelope {}", path.display()),
                    source: Some(Box::new(e)),
                })
            }
        }
    }
}
