// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem helpers shared by the codec and spool crates.

use std::path::Path;

/// Mode applied to every file the bridge places in the voicemail spool.
pub const VOICEMAIL_FILE_MODE: u32 = 0o660;

/// Restrict `path` to owner/group read-write.
///
/// Failure is logged and otherwise ignored; the voicemail application can
/// usually still read the file through its own group.
pub fn set_voicemail_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let perms = std::fs::Permissions::from_mode(VOICEMAIL_FILE_MODE);
        match std::fs::set_permissions(path, perms) {
            Ok(()) => tracing::debug!(path = %path.display(), "permissions set to 0660"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to set permissions"),
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn permissions_are_group_read_write() {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!("lrecomm-perm-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("msg0000.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        set_voicemail_permissions(&file);

        let mode = std::fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o660);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_does_not_panic() {
        set_voicemail_permissions(Path::new("/nonexistent/lrecomm/msg0000.wav"));
    }
}
