// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Codec bridge: WAV ⇄ transport payload through external programs.
//!
//! Every conversion is two chained invocations with a 16-bit mono PCM
//! intermediate. Intermediates are named temp files and disappear when the
//! conversion returns, whether it succeeded or not.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lrecomm_core::fsutil::set_voicemail_permissions;
use lrecomm_core::{AudioCodec, AudioFieldPayload, AudioFormat, LrecommError, ModeCode, ToolRunner};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::runner::ProcessRunner;

/// Sample rate for codec2 and for every decoded WAV.
const NARROWBAND_RATE: &str = "8000";
/// Sample rate fed to the opus encoder.
const WIDEBAND_RATE: &str = "16000";

/// Names (or paths) of the external programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPrograms {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub c2enc: String,
    pub c2dec: String,
}

impl Default for ToolPrograms {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".into(),
            ffprobe: "ffprobe".into(),
            c2enc: "c2enc".into(),
            c2dec: "c2dec".into(),
        }
    }
}

/// [`AudioCodec`] that shells out to ffmpeg and the codec2 tools.
#[derive(Debug, Clone)]
pub struct CodecBridge<R = ProcessRunner> {
    runner: R,
    programs: ToolPrograms,
}

impl CodecBridge<ProcessRunner> {
    pub fn with_programs(programs: ToolPrograms) -> Self {
        Self::new(ProcessRunner, programs)
    }
}

impl<R: ToolRunner> CodecBridge<R> {
    pub fn new(runner: R, programs: ToolPrograms) -> Self {
        Self { runner, programs }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Duration of `wav` in whole seconds, or 0 if the prober fails.
    pub async fn probe_duration(&self, wav: &Path) -> u64 {
        let args = strings(&[
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .into_iter()
        .chain([path_arg(wav)])
        .collect::<Vec<_>>();

        match self.runner.run(&self.programs.ffprobe, &args).await {
            Ok(output) => match output.stdout_lossy().trim().parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs >= 0.0 => secs as u64,
                _ => {
                    warn!(path = %wav.display(), output = %output.stdout_lossy().trim(), "unparsable duration");
                    0
                }
            },
            Err(e) => {
                warn!(path = %wav.display(), error = %e, "duration probe failed");
                0
            }
        }
    }

    async fn run_step(&self, program: &str, args: Vec<String>) -> Result<(), LrecommError> {
        self.runner.run(program, &args).await.map(|_| ())
    }

    async fn encode_inner(&self, wav: &Path, mode: ModeCode) -> Result<Vec<u8>, LrecommError> {
        let prefix = format!("audio_{}_", mode.code());
        let raw = temp_file(&prefix, ".raw", None)?;

        let (resample_rate, encoded) = match mode.codec2_bitrate() {
            Some(_) => (NARROWBAND_RATE, temp_file(&prefix, ".c2", None)?),
            None => (WIDEBAND_RATE, temp_file(&prefix, ".ogg", None)?),
        };

        let mut resample = strings(&["-y", "-i"]);
        resample.push(path_arg(wav));
        resample.extend(strings(&["-f", "s16le", "-ar", resample_rate, "-ac", "1"]));
        resample.push(path_arg(raw.path()));
        self.run_step(&self.programs.ffmpeg, resample).await?;

        match mode.codec2_bitrate() {
            Some(bitrate) => {
                let args = vec![bitrate.to_string(), path_arg(raw.path()), path_arg(encoded.path())];
                self.run_step(&self.programs.c2enc, args).await?;
            }
            None => {
                let mut args = strings(&["-y", "-f", "s16le", "-ar", WIDEBAND_RATE, "-ac", "1", "-i"]);
                args.push(path_arg(raw.path()));
                args.extend(strings(&["-c:a", "libopus"]));
                args.push(path_arg(encoded.path()));
                self.run_step(&self.programs.ffmpeg, args).await?;
            }
        }

        let bytes = tokio::fs::read(encoded.path())
            .await
            .map_err(|e| LrecommError::io("read encoded audio", encoded.path(), e))?;
        if bytes.is_empty() {
            return Err(LrecommError::Encode {
                message: format!("encoder produced no output for {}", wav.display()),
                source: None,
            });
        }
        Ok(bytes)
    }

    async fn decode_inner(&self, payload: &AudioFieldPayload, destination: &Path) -> Result<(), LrecommError> {
        let dir = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| LrecommError::io("create directory", &dir, e))?;

        let mode = payload.mode;
        let prefix = format!("audio_{}_", mode.code());
        let encoded = temp_file(&prefix, &format!(".{}", mode.extension()), Some(&dir))?;
        let raw = temp_file(&prefix, ".raw", Some(&dir))?;

        tokio::fs::write(encoded.path(), &payload.payload)
            .await
            .map_err(|e| LrecommError::io("write encoded audio", encoded.path(), e))?;

        match mode.codec2_bitrate() {
            Some(bitrate) => {
                let args = vec![bitrate.to_string(), path_arg(encoded.path()), path_arg(raw.path())];
                self.run_step(&self.programs.c2dec, args).await?;
            }
            None => {
                let mut args = strings(&["-y", "-i"]);
                args.push(path_arg(encoded.path()));
                args.extend(strings(&["-f", "s16le", "-ar", NARROWBAND_RATE, "-ac", "1"]));
                args.push(path_arg(raw.path()));
                self.run_step(&self.programs.ffmpeg, args).await?;
            }
        }

        let mut remux = strings(&["-y", "-f", "s16le", "-ar", NARROWBAND_RATE, "-ac", "1", "-i"]);
        remux.push(path_arg(raw.path()));
        remux.push(path_arg(destination));
        self.run_step(&self.programs.ffmpeg, remux).await?;

        if !destination.is_file() {
            return Err(LrecommError::Decode {
                message: format!("decoder produced no file at {}", destination.display()),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<R: ToolRunner> AudioCodec for CodecBridge<R> {
    async fn encode(
        &self,
        wav: &Path,
        format: AudioFormat,
        bitrate: u32,
    ) -> Result<AudioFieldPayload, LrecommError> {
        let mode = ModeCode::for_encoding(format, bitrate)?;
        let payload = self.encode_inner(wav, mode).await.map_err(|e| match e {
            e @ LrecommError::Encode { .. } => e,
            other => LrecommError::Encode {
                message: format!("failed to encode {}", wav.display()),
                source: Some(Box::new(other)),
            },
        })?;

        info!(
            path = %wav.display(),
            format = %format,
            mode = mode.code(),
            bytes = payload.len(),
            "audio encoded"
        );
        Ok(AudioFieldPayload { mode, payload })
    }

    async fn decode(&self, payload: &AudioFieldPayload, destination: &Path) -> Result<u64, LrecommError> {
        if payload.payload.is_empty() {
            return Err(LrecommError::Decode {
                message: "audio payload is empty".into(),
                source: None,
            });
        }

        self.decode_inner(payload, destination).await.map_err(|e| match e {
            e @ LrecommError::Decode { .. } => e,
            other => LrecommError::Decode {
                message: format!("failed to decode into {}", destination.display()),
                source: Some(Box::new(other)),
            },
        })?;

        set_voicemail_permissions(destination);
        let duration = self.probe_duration(destination).await;
        info!(
            path = %destination.display(),
            mode = payload.mode.code(),
            duration,
            "audio decoded"
        );
        Ok(duration)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn temp_file(prefix: &str, suffix: &str, dir: Option<&Path>) -> Result<NamedTempFile, LrecommError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix).suffix(suffix);
    match dir {
        Some(dir) => builder
            .tempfile_in(dir)
            .map_err(|e| LrecommError::io("create temporary file in", dir, e)),
        None => builder
            .tempfile()
            .map_err(|e| LrecommError::io("create temporary file in", std::env::temp_dir(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrecomm_test_utils::FakeToolRunner;

    fn bridge(runner: FakeToolRunner) -> CodecBridge<FakeToolRunner> {
        CodecBridge::new(runner, ToolPrograms::default())
    }

    fn wav_fixture(dir: &Path) -> PathBuf {
        let path = dir.join("in.wav");
        std::fs::write(&path, b"RIFF").unwrap();
        path
    }

    #[tokio::test]
    async fn codec2_encode_runs_resample_then_c2enc() {
        let dir = tempfile::tempdir().unwrap();
        let wav = wav_fixture(dir.path());
        let codec = bridge(FakeToolRunner::new());

        let payload = codec.encode(&wav, AudioFormat::Codec2, 3200).await.unwrap();

        assert_eq!(payload.mode, ModeCode::Codec2_3200);
        assert!(!payload.payload.is_empty());
        let calls = codec.runner().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, "ffmpeg");
        assert_eq!(&calls[0].args[..3], ["-y", "-i", wav.to_str().unwrap()]);
        assert_eq!(&calls[0].args[3..9], ["-f", "s16le", "-ar", "8000", "-ac", "1"]);
        assert_eq!(calls[1].program, "c2enc");
        assert_eq!(calls[1].args[0], "3200");
        assert!(calls[1].args[2].ends_with(".c2"));
    }

    #[tokio::test]
    async fn opus_encode_uses_wideband_and_libopus() {
        let dir = tempfile::tempdir().unwrap();
        let wav = wav_fixture(dir.path());
        let codec = bridge(FakeToolRunner::new());

        let payload = codec.encode(&wav, AudioFormat::Opus, 0).await.unwrap();

        assert_eq!(payload.mode, ModeCode::Opus);
        let calls = codec.runner().calls();
        assert!(calls[0].args.contains(&"16000".to_string()));
        assert_eq!(calls[1].program, "ffmpeg");
        assert!(calls[1].args.windows(2).any(|w| w == ["-c:a", "libopus"]));
    }

    #[tokio::test]
    async fn encode_failure_is_encode_error_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let wav = wav_fixture(dir.path());
        let runner = FakeToolRunner::new().failing_program("c2enc");
        let codec = bridge(runner);

        let err = codec.encode(&wav, AudioFormat::Codec2, 1200).await.unwrap_err();
        assert!(matches!(err, LrecommError::Encode { .. }));

        let raw = &codec.runner().calls()[0].args[9];
        assert!(!Path::new(raw).exists());
    }

    #[tokio::test]
    async fn empty_encoder_output_is_encode_error() {
        let dir = tempfile::tempdir().unwrap();
        let wav = wav_fixture(dir.path());
        let codec = bridge(FakeToolRunner::new().with_output_bytes(Vec::new()));

        let err = codec.encode(&wav, AudioFormat::Codec2, 1200).await.unwrap_err();
        assert!(err.to_string().contains("no output"));
    }

    #[tokio::test]
    async fn unsupported_bitrate_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let wav = wav_fixture(dir.path());
        let codec = bridge(FakeToolRunner::new());
        assert!(codec.encode(&wav, AudioFormat::Codec2, 2400).await.is_err());
        assert!(codec.runner().calls().is_empty());
    }

    #[tokio::test]
    async fn codec2_decode_writes_wav_and_probes() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("INBOX").join("msg0000.wav");
        let codec = bridge(FakeToolRunner::new().with_probe_output("7.89\n"));
        let payload = AudioFieldPayload {
            mode: ModeCode::Codec2_1200,
            payload: vec![1, 2, 3],
        };

        let duration = codec.decode(&payload, &dest).await.unwrap();

        assert_eq!(duration, 7);
        assert!(dest.is_file());
        let calls = codec.runner().calls();
        let programs: Vec<&str> = calls.iter().map(|c| c.program.as_str()).collect();
        assert_eq!(programs, ["c2dec", "ffmpeg", "ffprobe"]);
        assert_eq!(calls[0].args[0], "1200");
        // Only the decoded WAV is left behind.
        let left: Vec<_> = std::fs::read_dir(dest.parent().unwrap()).unwrap().collect();
        assert_eq!(left.len(), 1);
    }

    #[tokio::test]
    async fn opus_decode_goes_through_ffmpeg_twice() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.wav");
        let codec = bridge(FakeToolRunner::new().with_probe_output("3.0"));
        let payload = AudioFieldPayload {
            mode: ModeCode::Opus,
            payload: vec![9; 16],
        };

        codec.decode(&payload, &dest).await.unwrap();

        let calls = codec.runner().calls();
        assert_eq!(calls[0].program, "ffmpeg");
        assert!(calls[0].args[2].ends_with(".opus"));
        assert_eq!(calls[1].program, "ffmpeg");
        assert_eq!(calls[1].args.last().unwrap(), dest.to_str().unwrap());
    }

    #[tokio::test]
    async fn probe_failure_yields_zero_duration() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.wav");
        let codec = bridge(FakeToolRunner::new().failing_program("ffprobe"));
        let payload = AudioFieldPayload {
            mode: ModeCode::Codec2_3200,
            payload: vec![1],
        };

        assert_eq!(codec.decode(&payload, &dest).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn decoder_failure_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.wav");
        let codec = bridge(FakeToolRunner::new().failing_program("c2dec"));
        let payload = AudioFieldPayload {
            mode: ModeCode::Codec2_1200,
            payload: vec![1],
        };

        let err = codec.decode(&payload, &dest).await.unwrap_err();
        assert!(matches!(err, LrecommError::Decode { .. }));
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn decoded_wav_is_group_read_write() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.wav");
        let codec = bridge(FakeToolRunner::new().with_probe_output("1"));
        let payload = AudioFieldPayload {
            mode: ModeCode::Codec2_1200,
            payload: vec![1],
        };
        codec.decode(&payload, &dest).await.unwrap();

        let mode = std::fs::metadata(&dest).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o660);
    }
}
