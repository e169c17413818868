// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Poller status published once per cycle.
//!
//! The poller is the only writer. Readers (the operator menu) load the
//! latest snapshot without locking.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};

/// Counters after a completed poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollerStatus {
    /// WAVs still waiting in `OUTGOING` after the last cycle.
    pub pending: usize,
    /// Voicemails delivered since startup.
    pub sent: u64,
    /// Failed sends or archives since startup.
    pub errors: u64,
    pub last_cycle: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct StatusBoard {
    current: ArcSwap<PollerStatus>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<PollerStatus> {
        self.current.load_full()
    }

    pub fn publish(&self, status: PollerStatus) {
        self.current.store(Arc::new(status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_keep_their_snapshot_after_publish() {
        let board = StatusBoard::new();
        let before = board.snapshot();
        board.publish(PollerStatus {
            pending: 2,
            sent: 5,
            errors: 1,
            last_cycle: Some(Utc::now()),
        });

        assert_eq!(*before, PollerStatus::default());
        let after = board.snapshot();
        assert_eq!((after.pending, after.sent, after.errors), (2, 5, 1));
    }
}
