// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio field codec: voice payload ⇄ message field table.
//!
//! The audio field holds `[mode_code, payload]`. A missing or misshapen field
//! is the ordinary "no audio" case and yields `Ok(None)`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lrecomm_core::{
    AudioCodec, AudioFieldPayload, AudioFormat, FIELD_AUDIO, FieldTable, FieldValue, LrecommError,
    ModeCode, unix_now,
};
use tracing::{debug, warn};

/// A payload decoded to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudio {
    pub path: PathBuf,
    pub duration_secs: u64,
}

/// Raw contents of the audio field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAudioField {
    /// Code exactly as received, recognized or not.
    pub code: i64,
    pub payload: Vec<u8>,
}

impl RawAudioField {
    /// The payload with unrecognized codes mapped to 1200bps codec2.
    pub fn into_payload(self) -> AudioFieldPayload {
        AudioFieldPayload {
            mode: ModeCode::from_code(self.code),
            payload: self.payload,
        }
    }
}

/// Read the audio field, or `None` when absent or not `[int, bytes, ..]`.
pub fn read_audio_field(fields: &FieldTable) -> Option<RawAudioField> {
    let Some(value) = fields.get(FIELD_AUDIO) else {
        debug!("no audio field present");
        return None;
    };
    let parsed = value.as_list().and_then(|items| match items {
        [code, payload, ..] => Some(RawAudioField {
            code: code.as_int()?,
            payload: payload.as_bytes()?.to_vec(),
        }),
        _ => None,
    });
    if parsed.is_none() {
        warn!("malformed audio field, ignoring");
    }
    parsed
}

/// Store `payload` in the audio field, replacing any previous value.
pub fn write_audio_field(fields: &mut FieldTable, payload: AudioFieldPayload) {
    fields.insert(
        FIELD_AUDIO,
        FieldValue::List(vec![
            FieldValue::Int(payload.mode.code()),
            FieldValue::Bytes(payload.payload),
        ]),
    );
}

/// Packs WAVs into audio fields and unpacks them back to WAVs.
#[derive(Clone)]
pub struct AudioFieldCodec {
    codec: Arc<dyn AudioCodec>,
    format: AudioFormat,
    bitrate: u32,
    audio_out_dir: PathBuf,
}

impl std::fmt::Debug for AudioFieldCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFieldCodec")
            .field("format", &self.format)
            .field("bitrate", &self.bitrate)
            .field("audio_out_dir", &self.audio_out_dir)
            .finish_non_exhaustive()
    }
}

impl AudioFieldCodec {
    pub fn new(
        codec: Arc<dyn AudioCodec>,
        format: AudioFormat,
        bitrate: u32,
        audio_out_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            codec,
            format,
            bitrate,
            audio_out_dir: audio_out_dir.into(),
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Encode `wav` with the configured format and bitrate.
    pub async fn pack(&self, wav: &Path) -> Result<AudioFieldPayload, LrecommError> {
        self.pack_with(wav, self.format, self.bitrate).await
    }

    pub async fn pack_with(
        &self,
        wav: &Path,
        format: AudioFormat,
        bitrate: u32,
    ) -> Result<AudioFieldPayload, LrecommError> {
        self.codec.encode(wav, format, bitrate).await
    }

    /// Encode `wav` and store it in `fields`.
    pub async fn pack_into(&self, wav: &Path, fields: &mut FieldTable) -> Result<(), LrecommError> {
        let payload = self.pack(wav).await?;
        write_audio_field(fields, payload);
        Ok(())
    }

    /// Default decode target: `audio_<code>_<unix_ts>.wav` in the output directory.
    pub fn default_output_path(&self, code: i64) -> PathBuf {
        self.audio_out_dir
            .join(format!("audio_{code}_{}.wav", unix_now()))
    }

    /// Decode the audio field to `output`, or to [`default_output_path`](Self::default_output_path).
    ///
    /// Returns `Ok(None)` when the field is missing or malformed.
    pub async fn unpack(
        &self,
        fields: &FieldTable,
        output: Option<&Path>,
    ) -> Result<Option<DecodedAudio>, LrecommError> {
        let Some(raw) = read_audio_field(fields) else {
            return Ok(None);
        };

        let path = match output {
            Some(path) => path.to_path_buf(),
            None => self.default_output_path(raw.code),
        };
        let duration_secs = self.codec.decode(&raw.into_payload(), &path).await?;
        Ok(Some(DecodedAudio {
            path,
            duration_secs,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrecomm_test_utils::FakeCodec;

    fn field_codec(codec: FakeCodec, out: &Path) -> AudioFieldCodec {
        AudioFieldCodec::new(Arc::new(codec), AudioFormat::Codec2, 1200, out)
    }

    #[tokio::test]
    async fn missing_field_is_no_audio() {
        let dir = tempfile::tempdir().unwrap();
        let codec = field_codec(FakeCodec::new(), dir.path());
        assert_eq!(codec.unpack(&FieldTable::new(), None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_fields_are_no_audio() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeCodec::new();
        let codec = field_codec(fake.clone(), dir.path());

        let shapes = [
            FieldValue::Int(4),
            FieldValue::List(vec![FieldValue::Int(4)]),
            FieldValue::List(vec![FieldValue::Bytes(vec![1]), FieldValue::Int(4)]),
            FieldValue::Bytes(vec![1, 2, 3]),
        ];
        for shape in shapes {
            let mut fields = FieldTable::new();
            fields.insert(FIELD_AUDIO, shape);
            assert_eq!(codec.unpack(&fields, None).await.unwrap(), None);
        }
        assert!(fake.decoded().is_empty());
    }

    #[tokio::test]
    async fn unknown_code_decodes_as_codec2_1200_with_raw_code_in_name() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeCodec::new();
        let codec = field_codec(fake.clone(), dir.path());
        let mut fields = FieldTable::new();
        fields.insert(
            FIELD_AUDIO,
            FieldValue::List(vec![FieldValue::Int(99), FieldValue::Bytes(vec![5, 6])]),
        );

        let decoded = codec.unpack(&fields, None).await.unwrap().unwrap();

        let name = decoded.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("audio_99_") && name.ends_with(".wav"), "{name}");
        assert_eq!(decoded.path.parent().unwrap(), dir.path());
        assert_eq!(fake.decoded()[0].0, ModeCode::Codec2_1200);
    }

    #[tokio::test]
    async fn explicit_output_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let codec = field_codec(FakeCodec::new().with_duration(9), dir.path());
        let mut fields = FieldTable::new();
        write_audio_field(
            &mut fields,
            AudioFieldPayload {
                mode: ModeCode::Opus,
                payload: vec![1, 2, 3],
            },
        );
        let target = dir.path().join("INBOX/msg0000.wav");

        let decoded = codec.unpack(&fields, Some(&target)).await.unwrap().unwrap();

        assert_eq!(decoded.path, target);
        assert_eq!(decoded.duration_secs, 9);
        assert_eq!(std::fs::read(&target).unwrap(), [1, 2, 3]);
    }

    #[tokio::test]
    async fn pack_into_writes_mode_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("msg0000.wav");
        std::fs::write(&wav, b"pcm").unwrap();
        let codec = field_codec(FakeCodec::new(), dir.path());

        let mut fields = FieldTable::new();
        codec.pack_into(&wav, &mut fields).await.unwrap();

        let raw = read_audio_field(&fields).unwrap();
        assert_eq!(raw.code, 4);
        assert_eq!(raw.payload, b"pcm");
    }

    #[tokio::test]
    async fn extra_list_elements_are_tolerated() {
        let mut fields = FieldTable::new();
        fields.insert(
            FIELD_AUDIO,
            FieldValue::List(vec![
                FieldValue::Int(9),
                FieldValue::Bytes(vec![7]),
                FieldValue::Text("extra".into()),
            ]),
        );
        let raw = read_audio_field(&fields).unwrap();
        assert_eq!(raw.into_payload().mode, ModeCode::Codec2_3200);
    }
}
