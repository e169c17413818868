// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The bridge between the mesh and the voicemail spool.
//!
//! Long-running pieces, each driven by its own tokio task:
//!
//! - [`OutboundPoller`] ships `OUTGOING` voicemails to routed peers and
//!   publishes counters on a [`StatusBoard`].
//! - [`EventDispatcher`] delivers inbound messages ([`InboundHandler`]) and
//!   records announces ([`AnnounceHandler`]).
//! - [`run_announce_loop`] broadcasts this node's display name.
//! - [`CallListener`] records answered calls into `INBOX`.
//!
//! [`forward_inbox`] is the one-shot flow behind the voicemail notify hook,
//! and [`HandoffTransport`] reaches the mesh daemon through a shared
//! directory.

pub mod announce;
pub mod call;
pub mod events;
pub mod forward;
pub mod handoff;
pub mod history;
pub mod inbound;
pub mod poller;
pub mod resolver;
pub mod sender;
pub mod status;

pub use announce::{AnnounceHandler, run_announce_loop};
pub use call::CallListener;
pub use events::EventDispatcher;
pub use forward::{ForwardReport, ForwardStop, forward_inbox};
pub use handoff::HandoffTransport;
pub use history::History;
pub use inbound::{DeliveredVoicemail, Delivery, InboundHandler};
pub use poller::{CycleReport, OutboundPoller};
pub use resolver::PeerResolver;
pub use sender::{CHAT_TITLE, MessageSender, VOICEMAIL_CONTENT};
pub use status::{PollerStatus, StatusBoard};
