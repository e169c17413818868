// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio and file payloads for lrecomm messages.
//!
//! [`CodecBridge`] converts WAV files to and from transport payloads through
//! external programs run by a [`ToolRunner`](lrecomm_core::ToolRunner).
//! [`AudioFieldCodec`] places those payloads in a message field table, and
//! the [`attachments`] module does the same for files.

pub mod attachments;
pub mod bridge;
pub mod field;
pub mod runner;

pub use attachments::{Attachment, attach_files, read_attachments, save_attachments};
pub use bridge::{CodecBridge, ToolPrograms};
pub use field::{AudioFieldCodec, DecodedAudio, RawAudioField, read_audio_field, write_audio_field};
pub use runner::ProcessRunner;
