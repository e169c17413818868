// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Collects every violation instead of failing on the first one.

use lrecomm_core::AudioFormat;

use crate::diagnostic::ConfigError;
use crate::model::LrecommConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const CODEC2_BITRATES: &[u32] = &[1200, 3200];

fn invalid(errors: &mut Vec<ConfigError>, message: String) {
    errors.push(ConfigError::Validation { message });
}

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &LrecommConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.node.display_name.trim().is_empty() {
        invalid(&mut errors, "node.display_name must not be empty".into());
    }

    let level = config.node.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        invalid(
            &mut errors,
            format!(
                "node.log_level `{}` must be one of: {}",
                config.node.log_level,
                LOG_LEVELS.join(", ")
            ),
        );
    }

    if config.spool.base_dir.as_os_str().is_empty() {
        invalid(&mut errors, "spool.base_dir must not be empty".into());
    }

    let context = config.spool.context.trim();
    if context.is_empty() || context.contains('/') || context == ".." {
        invalid(
            &mut errors,
            format!(
                "spool.context `{}` must be a single directory name",
                config.spool.context
            ),
        );
    }

    if let Some(mailbox) = config
        .spool
        .call_mailbox
        .as_ref()
        .filter(|m| m.trim().is_empty() || m.contains('/'))
    {
        invalid(
            &mut errors,
            format!("spool.call_mailbox `{mailbox}` must be a single directory name"),
        );
    }

    if config.poller.interval_secs == 0 {
        invalid(&mut errors, "poller.interval_secs must be at least 1".into());
    }

    if config.codec.format == AudioFormat::Codec2
        && !CODEC2_BITRATES.contains(&config.codec.bitrate)
    {
        invalid(
            &mut errors,
            format!(
                "codec.bitrate must be 1200 or 3200 for codec2, got {}",
                config.codec.bitrate
            ),
        );
    }

    for (key, program) in [
        ("codec.ffmpeg", &config.codec.ffmpeg),
        ("codec.ffprobe", &config.codec.ffprobe),
        ("codec.c2enc", &config.codec.c2enc),
        ("codec.c2dec", &config.codec.c2dec),
    ] {
        if program.trim().is_empty() {
            invalid(&mut errors, format!("{key} must not be empty"));
        }
    }

    if config.mesh.path_timeout_secs == 0 {
        invalid(&mut errors, "mesh.path_timeout_secs must be at least 1".into());
    }

    if config.mesh.path_poll_interval_ms == 0 {
        invalid(
            &mut errors,
            "mesh.path_poll_interval_ms must be at least 1".into(),
        );
    }

    if config.mesh.inbound_poll_interval_ms == 0 {
        invalid(
            &mut errors,
            "mesh.inbound_poll_interval_ms must be at least 1".into(),
        );
    }

    if config.storage.database_path.trim().is_empty() {
        invalid(&mut errors, "storage.database_path must not be empty".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&LrecommConfig::default()).is_ok());
    }

    #[test]
    fn opus_ignores_bitrate() {
        let mut config = LrecommConfig::default();
        config.codec.format = AudioFormat::Opus;
        config.codec.bitrate = 700;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = LrecommConfig::default();
        config.poller.interval_secs = 0;
        config.codec.bitrate = 2400;
        config.node.log_level = "loud".into();
        config.spool.context = "a/b".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn zero_path_timeout_rejected() {
        let mut config = LrecommConfig::default();
        config.mesh.path_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("path_timeout_secs"));
    }
}
