// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mesh transport and messaging-protocol interface.

use async_trait::async_trait;

use crate::error::LrecommError;
use crate::types::{MeshEvent, OutboundMessage, PeerAddress, PeerIdentity};

/// The subset of the mesh stack and messaging layer the bridge consumes.
///
/// Path discovery, identity recall, outbound submission, announces, and
/// inbound delivery. Routing, cryptography, and stamps stay inside the
/// implementation.
#[async_trait]
pub trait MeshTransport: Send + Sync + 'static {
    /// This node's delivery address.
    fn local_address(&self) -> PeerAddress;

    /// True if a path to `peer` is currently known.
    async fn has_path(&self, peer: &PeerAddress) -> bool;

    /// Asks the network for a path to `peer`. Returns immediately.
    async fn request_path(&self, peer: &PeerAddress) -> Result<(), LrecommError>;

    /// Recalls the identity behind a destination, if it has been heard.
    async fn recall_identity(&self, peer: &PeerAddress) -> Option<PeerIdentity>;

    /// Hands a message to the messaging layer for delivery.
    async fn submit(&self, message: OutboundMessage) -> Result<(), LrecommError>;

    /// Broadcasts a presence announce carrying `display_name`.
    async fn announce(&self, display_name: &str) -> Result<(), LrecommError>;

    /// Returns the next pending inbound event, or `None` if nothing is waiting.
    async fn poll_inbound(&self) -> Result<Option<MeshEvent>, LrecommError>;
}
