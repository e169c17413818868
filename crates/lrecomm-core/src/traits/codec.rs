// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio conversion capabilities.

use std::path::Path;

use async_trait::async_trait;

use crate::error::LrecommError;
use crate::types::{AudioFieldPayload, AudioFormat};

/// Captured result of one external program invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Runs an external program to completion.
///
/// Implementations return [`LrecommError::Tool`] when the program exits
/// non-zero and an I/O error when it cannot be spawned.
#[async_trait]
pub trait ToolRunner: Send + Sync + 'static {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, LrecommError>;
}

/// Converts between WAV files and transport payloads.
#[async_trait]
pub trait AudioCodec: Send + Sync + 'static {
    /// Encodes `wav` into the given format. `bitrate` selects the codec2 mode.
    async fn encode(
        &self,
        wav: &Path,
        format: AudioFormat,
        bitrate: u32,
    ) -> Result<AudioFieldPayload, LrecommError>;

    /// Decodes `payload` into a playable WAV at `destination`.
    ///
    /// Returns the probed duration in whole seconds, or 0 when probing fails.
    async fn decode(
        &self,
        payload: &AudioFieldPayload,
        destination: &Path,
    ) -> Result<u64, LrecommError>;
}
