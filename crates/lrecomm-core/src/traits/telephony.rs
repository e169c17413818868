// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telephony pipeline interface used by the call listener.

use std::path::Path;

use async_trait::async_trait;

use crate::error::LrecommError;

/// Call state and line audio control of a real-time telephony pipeline.
#[async_trait]
pub trait Telephony: Send + Sync + 'static {
    /// True while an incoming call is waiting to be answered.
    async fn is_ringing(&self) -> bool;

    /// True while a call is connected.
    async fn is_in_call(&self) -> bool;

    /// Answers the ringing call, recording the remote audio into `sink`.
    async fn answer_into(&self, sink: &Path) -> Result<(), LrecommError>;

    /// Ends any active call and releases audio devices.
    async fn hangup(&self) -> Result<(), LrecommError>;
}
