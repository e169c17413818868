// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the lrecomm voicemail bridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use lrecomm_core::AudioFormat;
use serde::{Deserialize, Serialize};

/// Top-level lrecomm configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to the values a stock PABX install expects.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LrecommConfig {
    /// Node identity, logging, and announce settings.
    #[serde(default)]
    pub node: NodeConfig,

    /// Voicemail spool layout.
    #[serde(default)]
    pub spool: SpoolConfig,

    /// Mailbox route table location.
    #[serde(default)]
    pub routes: RoutesConfig,

    /// Outbound poller settings.
    #[serde(default)]
    pub poller: PollerConfig,

    /// External codec programs and payload format.
    #[serde(default)]
    pub codec: CodecConfig,

    /// Mesh transport handoff settings.
    #[serde(default)]
    pub mesh: MeshConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Node identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Name broadcast in announces.
    #[serde(default = "default_display_name")]
    pub display_name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds between automatic announces. Zero disables the announce loop.
    #[serde(default = "default_announce_interval")]
    pub announce_interval_secs: u64,

    /// Directory where received file attachments are written.
    #[serde(default = "default_received_files_dir")]
    pub received_files_dir: PathBuf,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
            log_level: default_log_level(),
            announce_interval_secs: default_announce_interval(),
            received_files_dir: default_received_files_dir(),
        }
    }
}

fn default_display_name() -> String {
    "AsteriskNode".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_announce_interval() -> u64 {
    60
}

fn default_received_files_dir() -> PathBuf {
    PathBuf::from("files/received")
}

/// Sidecar format written next to voicemail WAVs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SidecarStyle {
    /// Sectioned `[message]` file understood by the voicemail application.
    #[default]
    Asterisk,
    /// Single pipe-delimited line.
    Compact,
}

/// Voicemail spool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpoolConfig {
    /// Root of the voicemail spool, containing one directory per context.
    #[serde(default = "default_spool_base")]
    pub base_dir: PathBuf,

    /// Voicemail context served by this node.
    #[serde(default = "default_context")]
    pub context: String,

    /// Sidecar format for voicemails written by the bridge.
    #[serde(default)]
    pub sidecar: SidecarStyle,

    /// Mailbox that records answered calls, when a call listener runs.
    #[serde(default)]
    pub call_mailbox: Option<String>,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            base_dir: default_spool_base(),
            context: default_context(),
            sidecar: SidecarStyle::default(),
            call_mailbox: None,
        }
    }
}

fn default_spool_base() -> PathBuf {
    PathBuf::from("/var/spool/asterisk/voicemail")
}

fn default_context() -> String {
    "default".to_string()
}

/// Route table file locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutesConfig {
    /// JSON object mapping mailbox id to peer address.
    #[serde(default = "default_routes_path")]
    pub path: PathBuf,

    /// JSON file recording peers heard in announces.
    #[serde(default = "default_discovered_path")]
    pub discovered_path: PathBuf,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            path: default_routes_path(),
            discovered_path: default_discovered_path(),
        }
    }
}

fn default_routes_path() -> PathBuf {
    PathBuf::from("user_hashes.json")
}

fn default_discovered_path() -> PathBuf {
    PathBuf::from("discovered_peers.json")
}

/// Outbound poller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollerConfig {
    /// Seconds between scans of the `OUTGOING` directories.
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}

/// External codec configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CodecConfig {
    /// Payload format for outgoing voicemail.
    #[serde(default = "default_format")]
    pub format: AudioFormat,

    /// Codec2 bitrate (1200 or 3200).
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,

    /// Directory for decoded audio that has no spool slot.
    #[serde(default = "default_audio_out_dir")]
    pub audio_out_dir: PathBuf,

    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    #[serde(default = "default_c2enc")]
    pub c2enc: String,

    #[serde(default = "default_c2dec")]
    pub c2dec: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            bitrate: default_bitrate(),
            audio_out_dir: default_audio_out_dir(),
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            c2enc: default_c2enc(),
            c2dec: default_c2dec(),
        }
    }
}

fn default_format() -> AudioFormat {
    AudioFormat::Codec2
}

fn default_bitrate() -> u32 {
    1200
}

fn default_audio_out_dir() -> PathBuf {
    PathBuf::from("audio_out")
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_c2enc() -> String {
    "c2enc".to_string()
}

fn default_c2dec() -> String {
    "c2dec".to_string()
}

/// Mesh transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MeshConfig {
    /// Directory shared with the mesh daemon.
    #[serde(default = "default_handoff_dir")]
    pub handoff_dir: PathBuf,

    /// Seconds to wait for a path before giving up on a peer.
    #[serde(default = "default_path_timeout")]
    pub path_timeout_secs: u64,

    /// Milliseconds between path checks while waiting.
    #[serde(default = "default_path_poll_interval")]
    pub path_poll_interval_ms: u64,

    /// Milliseconds between checks for inbound messages.
    #[serde(default = "default_inbound_poll_interval")]
    pub inbound_poll_interval_ms: u64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            handoff_dir: default_handoff_dir(),
            path_timeout_secs: default_path_timeout(),
            path_poll_interval_ms: default_path_poll_interval(),
            inbound_poll_interval_ms: default_inbound_poll_interval(),
        }
    }
}

fn default_handoff_dir() -> PathBuf {
    PathBuf::from("mesh")
}

fn default_path_timeout() -> u64 {
    30
}

fn default_path_poll_interval() -> u64 {
    200
}

fn default_inbound_poll_interval() -> u64 {
    500
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("lrecomm").join("lrecomm.db"))
        .unwrap_or_else(|| PathBuf::from("lrecomm.db"))
        .to_string_lossy()
        .into_owned()
}

impl SpoolConfig {
    /// Directory holding all mailboxes of the configured context.
    pub fn context_dir(&self) -> PathBuf {
        self.base_dir.join(&self.context)
    }
}
