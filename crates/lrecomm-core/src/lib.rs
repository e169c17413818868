// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the lrecomm voicemail bridge.
//!
//! This crate provides the error type, the domain types shared by every
//! other crate (mailboxes, peer addresses, audio mode codes, the message
//! field table), and the traits through which the bridge reaches its
//! external collaborators.

pub mod error;
pub mod fields;
pub mod fsutil;
pub mod traits;
pub mod types;

pub use error::LrecommError;
pub use fields::{FIELD_AUDIO, FIELD_FILE_ATTACHMENTS, FieldTable, FieldValue};
pub use types::{
    Announce, AudioFieldPayload, AudioFormat, DeliveryMethod, InboundMessage, MailboxId,
    MeshEvent, ModeCode, OutboundMessage, PeerAddress, PeerIdentity,
};

pub use traits::{AudioCodec, MeshTransport, Telephony, ToolOutput, ToolRunner};

/// Unix timestamp in whole seconds.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_traits_are_object_safe() {
        fn _codec(_: &dyn AudioCodec) {}
        fn _runner(_: &dyn ToolRunner) {}
        fn _mesh(_: &dyn MeshTransport) {}
        fn _phone(_: &dyn Telephony) {}
    }

    #[test]
    fn unix_now_is_after_2024() {
        assert!(unix_now() > 1_704_067_200);
    }
}
