// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voicemail slot numbering.
//!
//! A slot is the `msgNNNN.wav` / `msgNNNN.txt` pair inside one folder. Slots
//! are listed by their WAV, but a stray sidecar still reserves its index.

use std::path::{Path, PathBuf};

use lrecomm_core::{LrecommError, MailboxId};

use crate::Folder;

const PREFIX: &str = "msg";
const WAV_EXT: &str = "wav";
const SIDECAR_EXT: &str = "txt";

/// `msg` followed by the zero-padded index.
pub fn slot_stem(index: u32) -> String {
    format!("{PREFIX}{index:04}")
}

pub fn slot_wav_name(index: u32) -> String {
    format!("{}.{WAV_EXT}", slot_stem(index))
}

/// Index encoded in a WAV file name, or `None` for anything not shaped like
/// `msg` + at least four digits + `.wav`.
pub fn parse_slot_index(file_name: &str) -> Option<u32> {
    parse_index_with_ext(file_name, WAV_EXT)
}

fn parse_index_with_ext(file_name: &str, ext: &str) -> Option<u32> {
    let digits = file_name
        .strip_prefix(PREFIX)?
        .strip_suffix(ext)?
        .strip_suffix('.')?;
    if digits.len() < 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Sidecar that accompanies `wav`.
pub fn sidecar_path(wav: &Path) -> PathBuf {
    wav.with_extension(SIDECAR_EXT)
}

/// Indices of every slot WAV in `dir`. A missing directory has none.
pub fn scan_indices(dir: &Path) -> Result<Vec<u32>, LrecommError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(LrecommError::io("list", dir, e)),
    };

    let mut indices = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LrecommError::io("list", dir, e))?;
        if let Some(index) = entry.file_name().to_str().and_then(parse_slot_index) {
            indices.push(index);
        }
    }
    indices.sort_unstable();
    Ok(indices)
}

/// `max(existing) + 1`, or 0 for an empty directory. Indices are never reused.
///
/// Sidecars without a WAV count too, so a new WAV never lands next to a
/// stale sidecar.
pub fn next_index(dir: &Path) -> Result<u32, LrecommError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(LrecommError::io("list", dir, e)),
    };

    let mut max: Option<u32> = None;
    for entry in entries {
        let entry = entry.map_err(|e| LrecommError::io("list", dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let index = parse_slot_index(name).or_else(|| parse_index_with_ext(name, SIDECAR_EXT));
        max = max.max(index);
    }

    match max {
        None => Ok(0),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| LrecommError::Internal(format!("slot indices exhausted in {}", dir.display()))),
    }
}

/// A numbered voicemail inside one spool folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoicemailSlot {
    pub mailbox: MailboxId,
    pub folder: Folder,
    pub index: u32,
    pub wav: PathBuf,
}

impl VoicemailSlot {
    pub fn new(mailbox: MailboxId, folder: Folder, dir: &Path, index: u32) -> Self {
        Self {
            mailbox,
            folder,
            index,
            wav: dir.join(slot_wav_name(index)),
        }
    }

    pub fn sidecar_path(&self) -> PathBuf {
        sidecar_path(&self.wav)
    }

    /// The sidecar, if one exists on disk.
    pub fn sidecar(&self) -> Option<PathBuf> {
        let path = self.sidecar_path();
        path.is_file().then_some(path)
    }

    pub fn file_name(&self) -> String {
        slot_wav_name(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn names_are_zero_padded() {
        assert_eq!(slot_wav_name(0), "msg0000.wav");
        assert_eq!(slot_wav_name(42), "msg0042.wav");
        assert_eq!(slot_wav_name(12345), "msg12345.wav");
    }

    #[test]
    fn only_slot_wavs_parse() {
        assert_eq!(parse_slot_index("msg0007.wav"), Some(7));
        assert_eq!(parse_slot_index("msg12345.wav"), Some(12345));
        assert_eq!(parse_slot_index("msg0007.txt"), None);
        assert_eq!(parse_slot_index("msg07.wav"), None);
        assert_eq!(parse_slot_index("msgabcd.wav"), None);
        assert_eq!(parse_slot_index("greeting.wav"), None);
        assert_eq!(parse_slot_index("msg0007wav"), None);
    }

    #[test]
    fn empty_or_missing_directory_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(next_index(dir.path()).unwrap(), 0);
        assert_eq!(next_index(&dir.path().join("absent")).unwrap(), 0);
    }

    #[test]
    fn gaps_are_not_filled() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["msg0000.wav", "msg0005.wav", "msg0003.txt", "notes.wav"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        assert_eq!(scan_indices(dir.path()).unwrap(), vec![0, 5]);
        assert_eq!(next_index(dir.path()).unwrap(), 6);
    }

    #[test]
    fn stray_sidecar_reserves_its_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("msg0000.wav"), b"").unwrap();
        std::fs::write(dir.path().join("msg0004.txt"), b"").unwrap();
        assert_eq!(scan_indices(dir.path()).unwrap(), vec![0]);
        assert_eq!(next_index(dir.path()).unwrap(), 5);
    }

    #[test]
    fn exhausted_index_space_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(slot_wav_name(u32::MAX)), b"").unwrap();
        let err = next_index(dir.path()).unwrap_err();
        assert!(matches!(err, LrecommError::Internal(_)), "{err}");
    }

    proptest! {
        #[test]
        fn successive_allocations_count_up_from_zero(count in 1usize..20) {
            let dir = tempfile::tempdir().unwrap();
            for expected in 0..count as u32 {
                let index = next_index(dir.path()).unwrap();
                prop_assert_eq!(index, expected);
                std::fs::write(dir.path().join(slot_wav_name(index)), b"").unwrap();
            }
        }

        #[test]
        fn allocation_never_collides(existing in proptest::collection::btree_set(0u32..500, 0..15)) {
            let dir = tempfile::tempdir().unwrap();
            for index in &existing {
                std::fs::write(dir.path().join(slot_wav_name(*index)), b"").unwrap();
            }
            let next = next_index(dir.path()).unwrap();
            prop_assert!(!existing.contains(&next));
            prop_assert!(existing.iter().all(|i| *i < next));
        }
    }
}
