// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the codec, spool, storage, and bridge crates.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

use crate::error::LrecommError;
use crate::fields::FieldTable;

/// Length in bytes of a mesh destination hash.
pub const ADDRESS_LEN: usize = 16;

/// A local voicemail mailbox, usually a PABX extension number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MailboxId(pub String);

impl MailboxId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MailboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MailboxId {
    fn from(s: &str) -> Self {
        MailboxId(s.to_string())
    }
}

/// A fixed-length mesh destination address.
///
/// Parsed from and displayed as 32 lowercase hex characters. Parsing is
/// case-insensitive and tolerates the `<...>` wrapping used in log output.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerAddress([u8; ADDRESS_LEN]);

impl PeerAddress {
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        PeerAddress(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Hex representation wrapped in angle brackets, as shown to operators.
    pub fn pretty(&self) -> String {
        format!("<{self}>")
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerAddress({self})")
    }
}

impl FromStr for PeerAddress {
    type Err = LrecommError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('<').trim_end_matches('>');
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(trimmed, &mut bytes)
            .map_err(|_| LrecommError::InvalidAddress(s.to_string()))?;
        Ok(PeerAddress(bytes))
    }
}

impl Serialize for PeerAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PeerAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Transport payload format for voice messages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// Low-bitrate vocoder.
    Codec2,
    /// General-purpose compressed audio.
    Opus,
}

/// Numeric tag carried in the audio field identifying the payload format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeCode {
    Codec2_1200,
    Codec2_3200,
    Opus,
}

impl ModeCode {
    /// The integer written on the wire.
    pub fn code(self) -> i64 {
        match self {
            ModeCode::Codec2_1200 => 4,
            ModeCode::Codec2_3200 => 9,
            ModeCode::Opus => 16,
        }
    }

    /// Maps a wire code to a mode, or `None` if the code is not recognized.
    pub fn try_from_code(code: i64) -> Option<Self> {
        match code {
            4 => Some(ModeCode::Codec2_1200),
            9 => Some(ModeCode::Codec2_3200),
            16 => Some(ModeCode::Opus),
            _ => None,
        }
    }

    /// Maps a wire code to a mode. Unrecognized codes decode as 1200bps codec2.
    pub fn from_code(code: i64) -> Self {
        Self::try_from_code(code).unwrap_or_else(|| {
            tracing::debug!(code, "unrecognized audio mode code, using codec2 1200bps");
            ModeCode::Codec2_1200
        })
    }

    /// Selects the mode for an encode request.
    ///
    /// Codec2 supports 1200 and 3200 bps; the bitrate is ignored for opus.
    pub fn for_encoding(format: AudioFormat, bitrate: u32) -> Result<Self, LrecommError> {
        match (format, bitrate) {
            (AudioFormat::Codec2, 1200) => Ok(ModeCode::Codec2_1200),
            (AudioFormat::Codec2, 3200) => Ok(ModeCode::Codec2_3200),
            (AudioFormat::Codec2, other) => Err(LrecommError::Encode {
                message: format!("unsupported codec2 bitrate {other}"),
                source: None,
            }),
            (AudioFormat::Opus, _) => Ok(ModeCode::Opus),
        }
    }

    pub fn format(self) -> AudioFormat {
        match self {
            ModeCode::Codec2_1200 | ModeCode::Codec2_3200 => AudioFormat::Codec2,
            ModeCode::Opus => AudioFormat::Opus,
        }
    }

    /// Vocoder bitrate for codec2 modes.
    pub fn codec2_bitrate(self) -> Option<u32> {
        match self {
            ModeCode::Codec2_1200 => Some(1200),
            ModeCode::Codec2_3200 => Some(3200),
            ModeCode::Opus => None,
        }
    }

    /// File extension used for the encoded intermediate.
    pub fn extension(self) -> &'static str {
        match self.format() {
            AudioFormat::Codec2 => "c2",
            AudioFormat::Opus => "opus",
        }
    }
}

/// One encoded voice message as carried in a message field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFieldPayload {
    pub mode: ModeCode,
    pub payload: Vec<u8>,
}

/// How the messaging layer should attempt delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    #[default]
    Direct,
    Opportunistic,
    Propagated,
}

/// A message handed to the messaging layer for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub destination: PeerAddress,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub fields: FieldTable,
    #[serde(default)]
    pub method: DeliveryMethod,
}

impl OutboundMessage {
    pub fn new(destination: PeerAddress, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            destination,
            title: title.into(),
            content: content.into(),
            fields: FieldTable::default(),
            method: DeliveryMethod::Direct,
        }
    }
}

/// A message delivered to this node by the messaging layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub source: PeerAddress,
    pub destination: PeerAddress,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub fields: FieldTable,
    #[serde(default)]
    pub signature_valid: bool,
    #[serde(default)]
    pub stamp_valid: bool,
}

/// A presence announcement heard on the mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announce {
    pub destination: PeerAddress,
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default, with = "crate::fields::base64_opt")]
    pub app_data: Option<Vec<u8>>,
}

impl Announce {
    /// Display name carried in the app data, or "Unknown".
    pub fn display_name(&self) -> String {
        self.app_data
            .as_deref()
            .and_then(|data| std::str::from_utf8(data).ok())
            .filter(|name| !name.trim().is_empty())
            .map(|name| name.trim().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Something that arrived from the mesh.
///
/// Externally tagged in JSON: `{"message": {..}}` or `{"announce": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshEvent {
    Message(InboundMessage),
    Announce(Announce),
}

/// An identity recalled for a known destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdentity {
    pub destination: PeerAddress,
    pub identity_hash: Option<String>,
}
