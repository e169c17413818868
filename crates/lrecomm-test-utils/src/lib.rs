// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for lrecomm integration tests.
//!
//! Everything here runs in-process: no ffmpeg, no codec2 tools, no mesh
//! daemon, no telephony hardware.
//!
//! # Components
//!
//! - [`FakeToolRunner`] - records external program calls and fakes their output files
//! - [`FakeCodec`] - in-process [`AudioCodec`](lrecomm_core::AudioCodec) with selectable failures
//! - [`MemoryMesh`] - in-memory mesh transport with injectable inbound events
//! - [`FakeTelephony`] - scripted incoming call
//! - [`write_test_wav`] - writes a real PCM WAV fixture

pub mod fake_codec;
pub mod fake_telephony;
pub mod fake_tools;
pub mod memory_mesh;
pub mod wav;

pub use fake_codec::FakeCodec;
pub use fake_telephony::FakeTelephony;
pub use fake_tools::{FakeToolRunner, ToolCall};
pub use memory_mesh::MemoryMesh;
pub use wav::write_test_wav;
