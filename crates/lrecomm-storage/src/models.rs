// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the history tables.
//!
//! Peer columns hold the lowercase hex form of a
//! [`PeerAddress`](lrecomm_core::PeerAddress). Times are unix seconds.

/// A peer heard in an announce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub destination: String,
    pub identity_hash: Option<String>,
    pub name: String,
    pub username: Option<String>,
    pub last_seen: i64,
}

/// Which side of a transfer this node was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

/// Horizontal placement of a chat line in the conversation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// One line of a conversation, sent or received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub content: String,
    pub time: i64,
    pub outgoing: bool,
}

impl ChatLine {
    /// Lines this node sent sit on the right.
    pub fn align(&self) -> Align {
        if self.outgoing { Align::Right } else { Align::Left }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoicemailRecord {
    pub id: i64,
    pub direction: Direction,
    pub peer: String,
    pub wav_path: String,
    pub time: i64,
    /// Always false for sent voicemails.
    pub unread: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    pub direction: Direction,
    pub peer: String,
    pub file_path: String,
    pub time: i64,
}
