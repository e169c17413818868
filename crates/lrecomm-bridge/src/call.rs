// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Answers incoming calls and records them as voicemail.

use std::sync::Arc;
use std::time::Duration;

use lrecomm_core::fsutil::set_voicemail_permissions;
use lrecomm_core::{LrecommError, MailboxId, Telephony};
use lrecomm_spool::{Folder, Spool, VoicemailSlot, render_compact_now, write_sidecar};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct CallListener {
    telephony: Arc<dyn Telephony>,
    spool: Spool,
    mailbox: MailboxId,
    poll_interval: Duration,
}

impl CallListener {
    pub fn new(telephony: Arc<dyn Telephony>, spool: Spool, mailbox: MailboxId) -> Self {
        Self {
            telephony,
            spool,
            mailbox,
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Record a ringing call, if any, into the next `INBOX` slot.
    pub async fn check_once(&self) -> Result<Option<VoicemailSlot>, LrecommError> {
        if !self.telephony.is_ringing().await {
            return Ok(None);
        }

        let slot = self.spool.allocate(&self.mailbox, Folder::Inbox)?;
        info!(mailbox = %self.mailbox, file = %slot.file_name(), "answering call");
        let started = Instant::now();
        self.telephony.answer_into(&slot.wav).await?;

        while self.telephony.is_in_call().await {
            tokio::time::sleep(self.poll_interval).await;
        }
        if let Err(e) = self.telephony.hangup().await {
            warn!(error = %e, "hangup failed");
        }

        let duration_secs = started.elapsed().as_secs();
        set_voicemail_permissions(&slot.wav);
        write_sidecar(&slot.sidecar_path(), &render_compact_now(duration_secs))?;
        info!(mailbox = %self.mailbox, file = %slot.file_name(), duration_secs, "call recorded");
        Ok(Some(slot))
    }

    pub async fn run(&self, cancel: CancellationToken) {
        info!(mailbox = %self.mailbox, "call listener started");
        loop {
            tokio::select! {
                result = self.check_once() => {
                    if let Err(e) = result {
                        warn!(error = %e, "call handling failed");
                    }
                }
                _ = cancel.cancelled() => break,
            }
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => break,
            }
        }
        if let Err(e) = self.telephony.hangup().await {
            warn!(error = %e, "hangup on shutdown failed");
        }
        info!("call listener shutting down");
    }
}
