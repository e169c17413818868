// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort history logging.
//!
//! Store failures never abort a delivery: they are logged and dropped. A
//! `History` without a database records nothing.

use std::path::Path;

use lrecomm_core::{PeerAddress, unix_now};
use lrecomm_storage::queries::{files, identities, messages, voicemails};
use lrecomm_storage::{Database, Direction, Identity};
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct History {
    db: Option<Database>,
}

impl History {
    pub fn new(db: Database) -> Self {
        Self { db: Some(db) }
    }

    pub fn disabled() -> Self {
        Self { db: None }
    }

    pub fn database(&self) -> Option<&Database> {
        self.db.as_ref()
    }

    pub async fn voicemail_sent(&self, receiver: &PeerAddress, wav: &Path) {
        let Some(db) = &self.db else { return };
        if let Err(e) = voicemails::log_sent(db, receiver, &wav.to_string_lossy(), unix_now()).await {
            warn!(error = %e, "failed to record sent voicemail");
        }
    }

    pub async fn voicemail_received(&self, sender: &PeerAddress, wav: &Path) {
        let Some(db) = &self.db else { return };
        if let Err(e) = voicemails::log_received(db, sender, &wav.to_string_lossy(), unix_now()).await {
            warn!(error = %e, "failed to record received voicemail");
        }
    }

    pub async fn file_transferred(&self, direction: Direction, peer: &PeerAddress, path: &Path) {
        let Some(db) = &self.db else { return };
        if let Err(e) = files::log_file(db, direction, peer, &path.to_string_lossy(), unix_now()).await {
            warn!(error = %e, ?direction, "failed to record file transfer");
        }
    }

    pub async fn message_sent(&self, receiver: &PeerAddress, content: &str) {
        let Some(db) = &self.db else { return };
        if let Err(e) = messages::log_sent(db, receiver, content, unix_now()).await {
            warn!(error = %e, "failed to record sent message");
        }
    }

    pub async fn message_received(&self, sender: &PeerAddress, content: &str) {
        let Some(db) = &self.db else { return };
        if let Err(e) = messages::log_received(db, sender, content, unix_now()).await {
            warn!(error = %e, "failed to record received message");
        }
    }

    pub async fn identity_seen(&self, identity: &Identity) {
        let Some(db) = &self.db else { return };
        if let Err(e) = identities::upsert_identity(db, identity).await {
            warn!(error = %e, destination = %identity.destination, "failed to record identity");
        }
    }
}
