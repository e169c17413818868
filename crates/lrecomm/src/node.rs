// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires configuration into the shared components every command uses.

use std::sync::Arc;
use std::time::Duration;

use lrecomm_bridge::{HandoffTransport, History, MessageSender, PeerResolver};
use lrecomm_codec::{AudioFieldCodec, CodecBridge, ToolPrograms};
use lrecomm_config::{LrecommConfig, RouteStore};
use lrecomm_core::{AudioCodec, LrecommError, MeshTransport};
use lrecomm_spool::Spool;
use lrecomm_storage::Database;
use tracing::warn;

pub struct Node {
    pub config: LrecommConfig,
    pub spool: Spool,
    pub routes: Arc<RouteStore>,
    pub mesh: Arc<dyn MeshTransport>,
    pub audio: AudioFieldCodec,
    pub sender: MessageSender,
    pub history: History,
}

impl Node {
    /// Connect to the mesh daemon through the configured handoff directory.
    pub async fn open(config: LrecommConfig) -> Result<Self, LrecommError> {
        let mesh = HandoffTransport::open(&config.mesh.handoff_dir).await?;
        let codec = CodecBridge::with_programs(ToolPrograms {
            ffmpeg: config.codec.ffmpeg.clone(),
            ffprobe: config.codec.ffprobe.clone(),
            c2enc: config.codec.c2enc.clone(),
            c2dec: config.codec.c2dec.clone(),
        });
        let history = open_history(&config.storage.database_path).await;
        Ok(Self::assemble(config, Arc::new(mesh), Arc::new(codec), history))
    }

    pub fn assemble(
        config: LrecommConfig,
        mesh: Arc<dyn MeshTransport>,
        codec: Arc<dyn AudioCodec>,
        history: History,
    ) -> Self {
        let spool = Spool::new(&config.spool.base_dir, &config.spool.context);
        let routes = Arc::new(RouteStore::load(&config.routes.path));
        let audio = AudioFieldCodec::new(
            codec,
            config.codec.format,
            config.codec.bitrate,
            &config.codec.audio_out_dir,
        );
        let resolver = PeerResolver::new(
            Arc::clone(&mesh),
            Duration::from_secs(config.mesh.path_timeout_secs),
            Duration::from_millis(config.mesh.path_poll_interval_ms),
        );
        let sender = MessageSender::new(resolver, audio.clone());
        Self {
            config,
            spool,
            routes,
            mesh,
            audio,
            sender,
            history,
        }
    }
}

/// History store, or a disabled one if the database cannot be opened.
pub async fn open_history(database_path: &str) -> History {
    match Database::open(database_path).await {
        Ok(db) => History::new(db),
        Err(e) => {
            warn!(path = database_path, error = %e, "history database unavailable, continuing without it");
            History::disabled()
        }
    }
}
