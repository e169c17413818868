// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound poller: ships staged voicemails from every routed mailbox.
//!
//! Each cycle walks the current route snapshot, sends every WAV in the
//! mailbox's `OUTGOING` folder in lexical order, and archives successes to
//! `SENT`. A failure leaves the file in place for the next cycle and never
//! stops the rest of the cycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lrecomm_config::RouteStore;
use lrecomm_spool::{Folder, Spool};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::history::History;
use crate::sender::MessageSender;
use crate::status::{PollerStatus, StatusBoard};

/// Outcome of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub sent: u64,
    pub errors: u64,
    pub pending: usize,
}

pub struct OutboundPoller {
    spool: Spool,
    routes: Arc<RouteStore>,
    sender: MessageSender,
    history: History,
    status: Arc<StatusBoard>,
    interval: Duration,
}

impl OutboundPoller {
    pub fn new(
        spool: Spool,
        routes: Arc<RouteStore>,
        sender: MessageSender,
        history: History,
        status: Arc<StatusBoard>,
        interval: Duration,
    ) -> Self {
        Self {
            spool,
            routes,
            sender,
            history,
            status,
            interval,
        }
    }

    pub fn status(&self) -> &Arc<StatusBoard> {
        &self.status
    }

    /// Run one cycle and publish the updated counters.
    pub async fn run_cycle(&self) -> CycleReport {
        let routes = self.routes.snapshot();
        let mut report = CycleReport::default();

        for (mailbox, peer) in routes.iter() {
            let wavs = match self.spool.pending_wavs(mailbox, Folder::Outgoing) {
                Ok(wavs) => wavs,
                Err(e) => {
                    warn!(mailbox = %mailbox, error = %e, "cannot list OUTGOING");
                    report.errors += 1;
                    continue;
                }
            };

            for wav in wavs {
                let title = format!("Voicemail for {mailbox}");
                if let Err(e) = self.sender.send_voicemail(peer, &wav, &title).await {
                    warn!(mailbox = %mailbox, file = %wav.display(), error = %e, "send failed, will retry");
                    report.errors += 1;
                    continue;
                }
                report.sent += 1;

                match self.spool.archive_sent(mailbox, &wav) {
                    Ok(moved) => {
                        info!(mailbox = %mailbox, file = %moved.to.display(), "voicemail sent");
                        self.history.voicemail_sent(peer, &moved.to).await;
                    }
                    Err(e) => {
                        warn!(mailbox = %mailbox, file = %wav.display(), error = %e, "sent but not archived");
                        report.errors += 1;
                        self.history.voicemail_sent(peer, &wav).await;
                    }
                }
            }
        }

        report.pending = routes
            .iter()
            .map(|(mailbox, _)| {
                self.spool
                    .pending_wavs(mailbox, Folder::Outgoing)
                    .map(|w| w.len())
                    .unwrap_or(0)
            })
            .sum();

        let previous = self.status.snapshot();
        self.status.publish(PollerStatus {
            pending: report.pending,
            sent: previous.sent + report.sent,
            errors: previous.errors + report.errors,
            last_cycle: Some(Utc::now()),
        });
        debug!(sent = report.sent, errors = report.errors, pending = report.pending, "poll cycle complete");
        report
    }

    /// Poll until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(interval = ?self.interval, "outbound poller started");
        let mut interval = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_cycle().await;
                }
                _ = cancel.cancelled() => {
                    info!("outbound poller shutting down");
                    break;
                }
            }
        }
    }
}
