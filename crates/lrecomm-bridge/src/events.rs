// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound event loop.

use std::sync::Arc;
use std::time::Duration;

use lrecomm_core::{MeshEvent, MeshTransport};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::announce::AnnounceHandler;
use crate::inbound::InboundHandler;

/// Routes inbound mesh events to their handlers.
pub struct EventDispatcher {
    mesh: Arc<dyn MeshTransport>,
    inbound: InboundHandler,
    announces: AnnounceHandler,
}

impl EventDispatcher {
    pub fn new(mesh: Arc<dyn MeshTransport>, inbound: InboundHandler, announces: AnnounceHandler) -> Self {
        Self {
            mesh,
            inbound,
            announces,
        }
    }

    /// Handle every event currently waiting. Returns how many were taken.
    ///
    /// A transport error ends the pass; the next tick picks up from there.
    pub async fn drain(&self) -> usize {
        let mut handled = 0;
        loop {
            let event = match self.mesh.poll_inbound().await {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "failed to read inbound event");
                    handled += 1;
                    break;
                }
            };
            handled += 1;
            match event {
                MeshEvent::Message(message) => {
                    if let Err(e) = self.inbound.handle(&message).await {
                        error!(from = %message.source.pretty(), error = %e, "inbound delivery failed");
                    }
                }
                MeshEvent::Announce(announce) => {
                    if let Err(e) = self.announces.handle(&announce).await {
                        warn!(peer = %announce.destination.pretty(), error = %e, "announce not recorded");
                    }
                }
            }
        }
        handled
    }

    pub async fn run(&self, poll_interval: Duration, cancel: CancellationToken) {
        info!("inbound loop started");
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.drain().await;
                }
                _ = cancel.cancelled() => {
                    info!("inbound loop shutting down");
                    break;
                }
            }
        }
    }
}
