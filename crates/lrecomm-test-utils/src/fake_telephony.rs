// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted telephony pipeline.
//!
//! Rings once when armed with [`FakeTelephony::ring`]. Answering writes the
//! configured audio to the sink and keeps the call up for a fixed number of
//! `is_in_call` checks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use lrecomm_core::{LrecommError, Telephony};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    ringing: bool,
    in_call_checks_left: u32,
    answered: Vec<PathBuf>,
    hangups: u32,
}

#[derive(Debug, Clone)]
pub struct FakeTelephony {
    audio: Vec<u8>,
    call_checks: u32,
    state: Arc<Mutex<State>>,
}

impl FakeTelephony {
    /// `audio` is what an answered call records; the call lasts for
    /// `call_checks` positive `is_in_call` answers.
    pub fn new(audio: Vec<u8>, call_checks: u32) -> Self {
        Self {
            audio,
            call_checks,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub async fn ring(&self) {
        self.state.lock().await.ringing = true;
    }

    pub async fn answered(&self) -> Vec<PathBuf> {
        self.state.lock().await.answered.clone()
    }

    pub async fn hangups(&self) -> u32 {
        self.state.lock().await.hangups
    }
}

#[async_trait]
impl Telephony for FakeTelephony {
    async fn is_ringing(&self) -> bool {
        self.state.lock().await.ringing
    }

    async fn is_in_call(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.in_call_checks_left == 0 {
            return false;
        }
        state.in_call_checks_left -= 1;
        true
    }

    async fn answer_into(&self, sink: &Path) -> Result<(), LrecommError> {
        tokio::fs::write(sink, &self.audio)
            .await
            .map_err(|e| LrecommError::io("record call into", sink, e))?;
        let mut state = self.state.lock().await;
        state.ringing = false;
        state.in_call_checks_left = self.call_checks;
        state.answered.push(sink.to_path_buf());
        Ok(())
    }

    async fn hangup(&self) -> Result<(), LrecommError> {
        let mut state = self.state.lock().await;
        state.in_call_checks_left = 0;
        state.hangups += 1;
        Ok(())
    }
}
