// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory mesh transport for deterministic testing.
//!
//! `MemoryMesh` implements `MeshTransport` with injectable inbound events,
//! captured outbound messages and announces, and a controllable set of
//! known paths.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use lrecomm_core::{
    LrecommError, MeshEvent, MeshTransport, OutboundMessage, PeerAddress, PeerIdentity,
};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    paths: HashSet<PeerAddress>,
    path_requests: Vec<PeerAddress>,
    identities: HashMap<PeerAddress, String>,
    submitted: Vec<OutboundMessage>,
    announces: Vec<String>,
    inbound: VecDeque<MeshEvent>,
    fail_submit: bool,
}

/// A mock mesh transport for testing.
#[derive(Debug, Clone)]
pub struct MemoryMesh {
    local: PeerAddress,
    learn_paths_on_request: bool,
    state: Arc<Mutex<State>>,
}

impl MemoryMesh {
    /// A mesh where every requested path becomes known immediately.
    pub fn new(local: PeerAddress) -> Self {
        Self {
            local,
            learn_paths_on_request: true,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// A mesh where requested paths never arrive unless added explicitly.
    pub fn unreachable(local: PeerAddress) -> Self {
        Self {
            learn_paths_on_request: false,
            ..Self::new(local)
        }
    }

    pub async fn add_path(&self, peer: PeerAddress) {
        self.state.lock().await.paths.insert(peer);
    }

    pub async fn add_identity(&self, peer: PeerAddress, identity_hash: &str) {
        self.state
            .lock()
            .await
            .identities
            .insert(peer, identity_hash.to_string());
    }

    /// Queue an event for the next `poll_inbound`.
    pub async fn inject(&self, event: MeshEvent) {
        self.state.lock().await.inbound.push_back(event);
    }

    /// Make every subsequent `submit` fail.
    pub async fn fail_submissions(&self, fail: bool) {
        self.state.lock().await.fail_submit = fail;
    }

    pub async fn submitted(&self) -> Vec<OutboundMessage> {
        self.state.lock().await.submitted.clone()
    }

    pub async fn announces(&self) -> Vec<String> {
        self.state.lock().await.announces.clone()
    }

    pub async fn path_requests(&self) -> Vec<PeerAddress> {
        self.state.lock().await.path_requests.clone()
    }
}

#[async_trait]
impl MeshTransport for MemoryMesh {
    fn local_address(&self) -> PeerAddress {
        self.local
    }

    async fn has_path(&self, peer: &PeerAddress) -> bool {
        self.state.lock().await.paths.contains(peer)
    }

    async fn request_path(&self, peer: &PeerAddress) -> Result<(), LrecommError> {
        let mut state = self.state.lock().await;
        state.path_requests.push(*peer);
        if self.learn_paths_on_request {
            state.paths.insert(*peer);
        }
        Ok(())
    }

    async fn recall_identity(&self, peer: &PeerAddress) -> Option<PeerIdentity> {
        let state = self.state.lock().await;
        state.paths.contains(peer).then(|| PeerIdentity {
            destination: *peer,
            identity_hash: state.identities.get(peer).cloned(),
        })
    }

    async fn submit(&self, message: OutboundMessage) -> Result<(), LrecommError> {
        let mut state = self.state.lock().await;
        if state.fail_submit {
            return Err(LrecommError::Transport {
                message: "simulated submission failure".into(),
                source: None,
            });
        }
        state.submitted.push(message);
        Ok(())
    }

    async fn announce(&self, display_name: &str) -> Result<(), LrecommError> {
        self.state
            .lock()
            .await
            .announces
            .push(display_name.to_string());
        Ok(())
    }

    async fn poll_inbound(&self) -> Result<Option<MeshEvent>, LrecommError> {
        Ok(self.state.lock().await.inbound.pop_front())
    }
}
