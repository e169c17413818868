// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the lrecomm voicemail bridge.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all lrecomm crates.
#[derive(Debug, Error)]
pub enum LrecommError {
    /// Configuration errors (invalid TOML, bad route file, unsupported codec settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors with the path or operation that failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    /// Storage backend errors (database connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Converting a WAV file into a transport payload failed.
    #[error("encode error: {message}")]
    Encode {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Converting a transport payload back into a WAV file failed.
    #[error("decode error: {message}")]
    Decode {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An external program exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Tool {
        program: String,
        status: String,
        stderr: String,
    },

    /// No path to the peer became known within the resolution timeout.
    #[error("peer {peer} unreachable after {waited:?}")]
    PeerUnreachable { peer: String, waited: Duration },

    /// The mesh transport rejected or failed an operation.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A peer address was not a 32 character hex string.
    #[error("invalid peer address `{0}`")]
    InvalidAddress(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LrecommError {
    /// Wrap an I/O error with a description of the operation and path.
    pub fn io(action: &str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        LrecommError::Io {
            context: format!("failed to {action} {}", path.display()),
            source,
        }
    }

    /// True for conditions that mean "the peer could not be reached", as
    /// opposed to local failures.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, LrecommError::PeerUnreachable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_mentions_action_and_path() {
        let err = LrecommError::io(
            "read",
            "/var/spool/x.wav",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("failed to read /var/spool/x.wav"), "{msg}");
        assert!(msg.contains("gone"));
    }

    #[test]
    fn peer_unreachable_is_distinct() {
        let err = LrecommError::PeerUnreachable {
            peer: "<00112233445566778899aabbccddeeff>".into(),
            waited: Duration::from_secs(30),
        };
        assert!(err.is_unreachable());
        assert!(!LrecommError::Internal("x".into()).is_unreachable());
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn tool_error_renders_program_and_stderr() {
        let err = LrecommError::Tool {
            program: "c2enc".into(),
            status: "exit status: 1".into(),
            stderr: "bad input".into(),
        };
        assert_eq!(err.to_string(), "c2enc exited with exit status: 1: bad input");
    }
}
