// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Narrow interfaces to the external collaborators the bridge drives.
//!
//! The mesh stack, the external codec programs, and the telephony pipeline
//! are never reimplemented here. Each is reached through one trait so that
//! production adapters and test fakes are interchangeable.

pub mod codec;
pub mod mesh;
pub mod telephony;

pub use codec::{AudioCodec, ToolOutput, ToolRunner};
pub use mesh::MeshTransport;
pub use telephony::Telephony;
