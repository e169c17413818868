// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds outbound messages and hands them to the mesh.

use std::path::{Path, PathBuf};

use lrecomm_codec::{AudioFieldCodec, attach_files};
use lrecomm_core::{LrecommError, OutboundMessage, PeerAddress};
use tracing::info;

use crate::resolver::PeerResolver;

/// Title used for plain chat messages.
pub const CHAT_TITLE: &str = "LXMF Message";
/// Body text accompanying a voicemail.
pub const VOICEMAIL_CONTENT: &str = "Audio message attached";

/// Resolves the peer, fills in the message, and submits it.
#[derive(Clone)]
pub struct MessageSender {
    resolver: PeerResolver,
    audio: AudioFieldCodec,
}

impl MessageSender {
    pub fn new(resolver: PeerResolver, audio: AudioFieldCodec) -> Self {
        Self { resolver, audio }
    }

    pub fn resolver(&self) -> &PeerResolver {
        &self.resolver
    }

    /// Encode `wav` and send it to `peer` under `title`.
    pub async fn send_voicemail(&self, peer: &PeerAddress, wav: &Path, title: &str) -> Result<(), LrecommError> {
        self.resolver.resolve(peer).await?;
        let mut message = OutboundMessage::new(*peer, title, VOICEMAIL_CONTENT);
        self.audio.pack_into(wav, &mut message.fields).await?;
        self.resolver.mesh().submit(message).await?;
        info!(peer = %peer.pretty(), wav = %wav.display(), title, "voicemail submitted");
        Ok(())
    }

    pub async fn send_text(&self, peer: &PeerAddress, content: &str) -> Result<(), LrecommError> {
        self.resolver.resolve(peer).await?;
        let message = OutboundMessage::new(*peer, CHAT_TITLE, content);
        self.resolver.mesh().submit(message).await?;
        info!(peer = %peer.pretty(), chars = content.chars().count(), "text message submitted");
        Ok(())
    }

    pub async fn send_files(&self, peer: &PeerAddress, paths: &[PathBuf]) -> Result<(), LrecommError> {
        self.resolver.resolve(peer).await?;
        let mut message = OutboundMessage::new(*peer, CHAT_TITLE, "File attached");
        attach_files(&mut message.fields, paths).await?;
        self.resolver.mesh().submit(message).await?;
        info!(peer = %peer.pretty(), count = paths.len(), "files submitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use lrecomm_codec::{read_attachments, read_audio_field};
    use lrecomm_core::AudioFormat;
    use lrecomm_test_utils::{FakeCodec, MemoryMesh};

    fn addr(fill: u8) -> PeerAddress {
        PeerAddress::from_bytes([fill; 16])
    }

    fn sender(mesh: &MemoryMesh, codec: FakeCodec, out: &Path) -> MessageSender {
        let resolver = PeerResolver::new(
            Arc::new(mesh.clone()),
            Duration::from_millis(200),
            Duration::from_millis(10),
        );
        let audio = AudioFieldCodec::new(Arc::new(codec), AudioFormat::Codec2, 3200, out);
        MessageSender::new(resolver, audio)
    }

    #[tokio::test]
    async fn voicemail_carries_audio_field() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("msg0000.wav");
        std::fs::write(&wav, b"pcm").unwrap();
        let mesh = MemoryMesh::new(addr(0));

        sender(&mesh, FakeCodec::new(), dir.path())
            .send_voicemail(&addr(1), &wav, "Voicemail for 6001")
            .await
            .unwrap();

        let submitted = mesh.submitted().await;
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].destination, addr(1));
        assert_eq!(submitted[0].title, "Voicemail for 6001");
        assert_eq!(submitted[0].content, VOICEMAIL_CONTENT);
        let raw = read_audio_field(&submitted[0].fields).unwrap();
        assert_eq!((raw.code, raw.payload.as_slice()), (9, b"pcm".as_slice()));
    }

    #[tokio::test]
    async fn text_and_files_use_chat_title() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("map.png");
        std::fs::write(&file, b"png").unwrap();
        let mesh = MemoryMesh::new(addr(0));
        let sender = sender(&mesh, FakeCodec::new(), dir.path());

        sender.send_text(&addr(4), "hello").await.unwrap();
        sender.send_files(&addr(4), &[file]).await.unwrap();

        let submitted = mesh.submitted().await;
        assert!(submitted.iter().all(|m| m.title == CHAT_TITLE));
        assert_eq!(submitted[0].content, "hello");
        assert_eq!(read_attachments(&submitted[1].fields)[0].name, "map.png");
    }

    #[tokio::test]
    async fn unreachable_peer_submits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = MemoryMesh::unreachable(addr(0));
        let err = sender(&mesh, FakeCodec::new(), dir.path())
            .send_text(&addr(5), "anyone?")
            .await
            .unwrap_err();
        assert!(err.is_unreachable());
        assert!(mesh.submitted().await.is_empty());
    }
}
