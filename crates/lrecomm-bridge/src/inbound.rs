// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery of inbound mesh messages into the spool and history.
//!
//! Voicemail goes to the `INBOX` of the mailbox routed to the sender.
//! Attachments and chat text are kept whether or not the sender is routed.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use lrecomm_codec::{AudioFieldCodec, DecodedAudio, read_audio_field, save_attachments};
use lrecomm_config::{RouteStore, SidecarStyle};
use lrecomm_core::fsutil::set_voicemail_permissions;
use lrecomm_core::{InboundMessage, LrecommError, MailboxId};
use lrecomm_spool::{AsteriskSidecar, Folder, Spool, render_compact_now, write_sidecar};
use lrecomm_storage::Direction;
use tracing::{debug, info, warn};

use crate::history::History;

/// What was kept from one inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    pub voicemail: Option<DeliveredVoicemail>,
    pub files: Vec<PathBuf>,
    pub text_logged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredVoicemail {
    pub mailbox: MailboxId,
    pub wav: PathBuf,
    pub sidecar: PathBuf,
    pub duration_secs: u64,
}

pub struct InboundHandler {
    spool: Spool,
    routes: Arc<RouteStore>,
    audio: AudioFieldCodec,
    sidecar_style: SidecarStyle,
    received_files_dir: PathBuf,
    history: History,
}

impl InboundHandler {
    pub fn new(
        spool: Spool,
        routes: Arc<RouteStore>,
        audio: AudioFieldCodec,
        sidecar_style: SidecarStyle,
        received_files_dir: impl Into<PathBuf>,
        history: History,
    ) -> Self {
        Self {
            spool,
            routes,
            audio,
            sidecar_style,
            received_files_dir: received_files_dir.into(),
            history,
        }
    }

    pub async fn handle(&self, message: &InboundMessage) -> Result<Delivery, LrecommError> {
        let source = message.source;
        info!(
            from = %source.pretty(),
            title = %message.title,
            signature_valid = message.signature_valid,
            "message received"
        );

        let mut delivery = Delivery::default();

        match save_attachments(&message.fields, &self.received_files_dir, &source).await {
            Ok(saved) => {
                for path in saved {
                    self.history.file_transferred(Direction::Received, &source, &path).await;
                    delivery.files.push(path);
                }
            }
            Err(e) => warn!(from = %source.pretty(), error = %e, "failed to save attachments"),
        }

        if read_audio_field(&message.fields).is_none() {
            if !message.content.trim().is_empty() {
                self.history.message_received(&source, &message.content).await;
                delivery.text_logged = true;
            }
            debug!(from = %source.pretty(), "no audio in message");
            return Ok(delivery);
        }

        let Some(mailbox) = self.routes.snapshot().mailbox_for(&source).cloned() else {
            warn!(from = %source.pretty(), "voicemail from unrouted peer dropped");
            return Ok(delivery);
        };

        let slot = self.spool.allocate(&mailbox, Folder::Inbox)?;
        let Some(DecodedAudio { path, duration_secs }) = self.audio.unpack(&message.fields, Some(&slot.wav)).await?
        else {
            return Ok(delivery);
        };
        set_voicemail_permissions(&path);

        let sidecar = slot.sidecar_path();
        let contents = match self.sidecar_style {
            SidecarStyle::Asterisk => AsteriskSidecar {
                mailbox: mailbox.clone(),
                context: self.spool.context().to_string(),
                source,
                duration_secs,
                recorded_at: Utc::now(),
            }
            .render(),
            SidecarStyle::Compact => render_compact_now(duration_secs),
        };
        write_sidecar(&sidecar, &contents)?;

        info!(
            mailbox = %mailbox,
            file = %slot.file_name(),
            duration_secs,
            "voicemail delivered to INBOX"
        );
        self.history.voicemail_received(&source, &path).await;

        delivery.voicemail = Some(DeliveredVoicemail {
            mailbox,
            wav: path,
            sidecar,
            duration_secs,
        });
        Ok(delivery)
    }
}
