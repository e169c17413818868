// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forwards a mailbox's `INBOX` to its routed peer, oldest first.
//!
//! Each forwarded voicemail moves to `Old` under a fresh `Old` index. The
//! flow stops at the first send failure, leaving that voicemail in `INBOX`.

use lrecomm_config::RouteTable;
use lrecomm_core::{LrecommError, MailboxId};
use lrecomm_spool::{Folder, Spool};
use tracing::info;

use crate::history::History;
use crate::sender::MessageSender;

/// Why forwarding ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardStop {
    InboxEmpty,
    NoRoute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardReport {
    pub forwarded: usize,
    pub stop: ForwardStop,
}

pub async fn forward_inbox(
    spool: &Spool,
    routes: &RouteTable,
    sender: &MessageSender,
    history: &History,
    mailbox: &MailboxId,
) -> Result<ForwardReport, LrecommError> {
    let Some(peer) = routes.peer_for(mailbox) else {
        info!(mailbox = %mailbox, "no route for mailbox, nothing forwarded");
        return Ok(ForwardReport {
            forwarded: 0,
            stop: ForwardStop::NoRoute,
        });
    };

    let title = format!("Voicemail from {mailbox}");
    let mut forwarded = 0;
    while let Some(slot) = spool.oldest(mailbox, Folder::Inbox)? {
        sender.send_voicemail(&peer, &slot.wav, &title).await?;
        let moved = spool.archive_to_old(&slot)?;
        history.voicemail_sent(&peer, &moved.to).await;
        forwarded += 1;
    }

    info!(mailbox = %mailbox, forwarded, "INBOX forwarded");
    Ok(ForwardReport {
        forwarded,
        stop: ForwardStop::InboxEmpty,
    })
}
