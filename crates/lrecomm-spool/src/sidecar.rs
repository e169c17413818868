// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metadata sidecars written next to voicemail WAVs.
//!
//! Two formats exist. The sectioned form is what the voicemail application
//! reads when it lists a mailbox; key set and order must not change. The
//! compact form is a single pipe-delimited line used for recorded calls.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};
use lrecomm_core::fsutil::set_voicemail_permissions;
use lrecomm_core::{LrecommError, MailboxId, PeerAddress};
use tracing::info;

/// Serial appended to every generated `msg_id`.
const MSG_ID_SERIAL: &str = "00000001";

/// Sectioned sidecar for a voicemail that arrived from the mesh.
#[derive(Debug, Clone)]
pub struct AsteriskSidecar {
    pub mailbox: MailboxId,
    pub context: String,
    pub source: PeerAddress,
    pub duration_secs: u64,
    pub recorded_at: DateTime<Utc>,
}

impl AsteriskSidecar {
    pub fn render(&self) -> String {
        let epoch = self.recorded_at.timestamp();
        let origdate = self.recorded_at.format("%a %b %d %I:%M:%S %p UTC %Y");
        let mailbox = &self.mailbox;

        let mut out = String::from(";\n; Message Information file\n;\n[message]\n");
        let lines: [(&str, String); 14] = [
            ("origmailbox", mailbox.to_string()),
            ("context", self.context.clone()),
            ("macrocontext", String::new()),
            ("exten", mailbox.to_string()),
            ("rdnis", "unknown".to_string()),
            ("priority", "2".to_string()),
            ("callerchan", format!("PJSIP/{mailbox}-{}", self.source.pretty())),
            ("callerid", mailbox.to_string()),
            ("origdate", origdate.to_string()),
            ("origtime", epoch.to_string()),
            ("category", String::new()),
            ("msg_id", format!("{epoch}-{MSG_ID_SERIAL}")),
            ("flag", String::new()),
            ("duration", self.duration_secs.to_string()),
        ];
        for (key, value) in lines {
            let _ = writeln!(out, "{key}={value}");
        }
        out
    }
}

/// Single-line sidecar: `epoch|H:M|Weekday|Month D Year||callerid=""|duration=N`.
///
/// Hour and minute are not zero-padded.
pub fn render_compact<Tz: TimeZone>(recorded_at: &DateTime<Tz>, duration_secs: u64) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}|{}:{}|{}|{} {} {}||callerid=\"\"|duration={}\n",
        recorded_at.timestamp(),
        recorded_at.hour(),
        recorded_at.minute(),
        recorded_at.format("%A"),
        recorded_at.format("%B"),
        recorded_at.day(),
        recorded_at.year(),
        duration_secs,
    )
}

/// Compact sidecar stamped with the current local time.
pub fn render_compact_now(duration_secs: u64) -> String {
    render_compact(&Local::now(), duration_secs)
}

/// Write sidecar text to `path` and restrict its permissions.
///
/// Callers write the sidecar only after the WAV it describes is complete.
pub fn write_sidecar(path: &Path, contents: &str) -> Result<(), LrecommError> {
    std::fs::write(path, contents).map_err(|e| LrecommError::io("write sidecar", path, e))?;
    set_voicemail_permissions(path);
    info!(path = %path.display(), "sidecar written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn sample() -> AsteriskSidecar {
        AsteriskSidecar {
            mailbox: MailboxId::from("6001"),
            context: "default".to_string(),
            source: "0123456789abcdef0123456789abcdef".parse().unwrap(),
            duration_secs: 12,
            recorded_at: Utc.with_ymd_and_hms(2025, 3, 7, 14, 5, 9).unwrap(),
        }
    }

    #[test]
    fn asterisk_sidecar_has_fixed_key_order() {
        let text = sample().render();
        let keys: Vec<&str> = text
            .lines()
            .filter(|l| !l.starts_with(';') && !l.starts_with('['))
            .filter_map(|l| l.split_once('=').map(|(k, _)| k))
            .collect();
        assert_eq!(
            keys,
            [
                "origmailbox",
                "context",
                "macrocontext",
                "exten",
                "rdnis",
                "priority",
                "callerchan",
                "callerid",
                "origdate",
                "origtime",
                "category",
                "msg_id",
                "flag",
                "duration"
            ]
        );
    }

    #[test]
    fn asterisk_sidecar_values() {
        let text = sample().render();
        assert!(text.starts_with(";\n; Message Information file\n;\n[message]\n"));
        assert!(text.contains("callerchan=PJSIP/6001-<0123456789abcdef0123456789abcdef>\n"));
        assert!(text.contains("origdate=Fri Mar 07 02:05:09 PM UTC 2025\n"));
        assert!(text.contains("origtime=1741356309\n"));
        assert!(text.contains("msg_id=1741356309-00000001\n"));
        assert!(text.ends_with("duration=12\n"));
    }

    #[test]
    fn compact_sidecar_line() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let at = offset.with_ymd_and_hms(2025, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(
            render_compact(&at, 4),
            "1741338300|9:5|Friday|March 7 2025||callerid=\"\"|duration=4\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn written_sidecar_is_group_read_write() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msg0000.txt");
        write_sidecar(&path, &sample().render()).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o660);
    }
}
