// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process audio codec.
//!
//! `encode` returns the WAV file's bytes as the payload; `decode` writes the
//! payload bytes to the destination. Round trips are therefore exact, which
//! makes spool assertions straightforward.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use lrecomm_core::{AudioCodec, AudioFieldPayload, AudioFormat, LrecommError, ModeCode};

#[derive(Debug, Default)]
struct State {
    failing_files: HashSet<String>,
    fail_decode: bool,
    encoded: Vec<PathBuf>,
    decoded: Vec<(ModeCode, PathBuf)>,
}

/// [`AudioCodec`] double with per-file encode failures.
#[derive(Debug, Clone)]
pub struct FakeCodec {
    state: Arc<Mutex<State>>,
    duration_secs: u64,
}

impl FakeCodec {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            duration_secs: 3,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fail `encode` for any WAV with this file name.
    pub fn failing_on(self, file_name: &str) -> Self {
        self.state().failing_files.insert(file_name.to_string());
        self
    }

    /// Fail every `decode`.
    pub fn failing_decode(self) -> Self {
        self.state().fail_decode = true;
        self
    }

    /// Duration reported by `decode`.
    pub fn with_duration(mut self, secs: u64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// WAVs passed to `encode`, in call order, including failed ones.
    pub fn encoded(&self) -> Vec<PathBuf> {
        self.state().encoded.clone()
    }

    /// Mode and destination of each successful `decode`.
    pub fn decoded(&self) -> Vec<(ModeCode, PathBuf)> {
        self.state().decoded.clone()
    }
}

impl Default for FakeCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioCodec for FakeCodec {
    async fn encode(
        &self,
        wav: &Path,
        format: AudioFormat,
        bitrate: u32,
    ) -> Result<AudioFieldPayload, LrecommError> {
        let fails = {
            let mut state = self.state();
            state.encoded.push(wav.to_path_buf());
            wav.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| state.failing_files.contains(n))
        };
        if fails {
            return Err(LrecommError::Encode {
                message: format!("simulated encoder failure for {}", wav.display()),
                source: None,
            });
        }

        let mode = ModeCode::for_encoding(format, bitrate)?;
        let payload = tokio::fs::read(wav)
            .await
            .map_err(|e| LrecommError::io("read", wav, e))?;
        Ok(AudioFieldPayload { mode, payload })
    }

    async fn decode(&self, payload: &AudioFieldPayload, destination: &Path) -> Result<u64, LrecommError> {
        if self.state().fail_decode {
            return Err(LrecommError::Decode {
                message: "simulated decoder failure".into(),
                source: None,
            });
        }
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LrecommError::io("create directory", parent, e))?;
        }
        tokio::fs::write(destination, &payload.payload)
            .await
            .map_err(|e| LrecommError::io("write", destination, e))?;
        self.state()
            .decoded
            .push((payload.mode, destination.to_path_buf()));
        Ok(self.duration_secs)
    }
}
