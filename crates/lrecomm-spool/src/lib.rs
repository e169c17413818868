// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voicemail spool state machine.
//!
//! Layout: `<base>/<context>/<mailbox>/{INBOX,OUTGOING,SENT,Old}`. Each folder
//! keeps its own slot index space. Moves carry the optional `.txt` sidecar
//! with the WAV, create the destination folder on demand, and never
//! overwrite an existing file.

pub mod sidecar;
pub mod slot;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use lrecomm_core::{LrecommError, MailboxId};
use strum::{Display, IntoStaticStr};
use tracing::{debug, info, warn};

pub use sidecar::{AsteriskSidecar, render_compact, render_compact_now, write_sidecar};
pub use slot::{VoicemailSlot, next_index, parse_slot_index, sidecar_path, slot_wav_name};

/// Per-mailbox spool folder. The display form is the on-disk directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum Folder {
    /// Received, not yet handled.
    #[strum(serialize = "INBOX")]
    Inbox,
    /// Staged for sending.
    #[strum(serialize = "OUTGOING")]
    Outgoing,
    /// Confirmed sent.
    #[strum(serialize = "SENT")]
    Sent,
    /// Archived after forwarding.
    #[strum(serialize = "Old")]
    Old,
}

/// Result of moving a slot into another folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedSlot {
    pub from: PathBuf,
    pub to: PathBuf,
    pub sidecar_moved: bool,
}

/// One voicemail context inside the spool.
#[derive(Debug, Clone)]
pub struct Spool {
    base_dir: PathBuf,
    context: String,
}

impl Spool {
    pub fn new(base_dir: impl Into<PathBuf>, context: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            context: context.into(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn mailbox_dir(&self, mailbox: &MailboxId) -> PathBuf {
        self.base_dir.join(&self.context).join(mailbox.as_str())
    }

    pub fn folder_dir(&self, mailbox: &MailboxId, folder: Folder) -> PathBuf {
        let name: &'static str = folder.into();
        self.mailbox_dir(mailbox).join(name)
    }

    /// Create `folder` for `mailbox` if it does not exist.
    pub fn ensure_folder(&self, mailbox: &MailboxId, folder: Folder) -> Result<PathBuf, LrecommError> {
        let dir = self.folder_dir(mailbox, folder);
        std::fs::create_dir_all(&dir).map_err(|e| LrecommError::io("create directory", &dir, e))?;
        Ok(dir)
    }

    /// Reserve the next slot in `folder`. Nothing is written; the caller
    /// creates the WAV at `slot.wav`.
    pub fn allocate(&self, mailbox: &MailboxId, folder: Folder) -> Result<VoicemailSlot, LrecommError> {
        let dir = self.ensure_folder(mailbox, folder)?;
        let index = next_index(&dir)?;
        debug!(mailbox = %mailbox, folder = %folder, index, "slot allocated");
        Ok(VoicemailSlot::new(mailbox.clone(), folder, &dir, index))
    }

    /// Numbered slots in `folder`, lowest index first.
    pub fn slots(&self, mailbox: &MailboxId, folder: Folder) -> Result<Vec<VoicemailSlot>, LrecommError> {
        let dir = self.folder_dir(mailbox, folder);
        Ok(slot::scan_indices(&dir)?
            .into_iter()
            .map(|index| VoicemailSlot::new(mailbox.clone(), folder, &dir, index))
            .collect())
    }

    /// Lowest-index slot in `folder`.
    pub fn oldest(&self, mailbox: &MailboxId, folder: Folder) -> Result<Option<VoicemailSlot>, LrecommError> {
        Ok(self.slots(mailbox, folder)?.into_iter().next())
    }

    /// Every `.wav` in `folder`, numbered or not, in lexical order.
    pub fn pending_wavs(&self, mailbox: &MailboxId, folder: Folder) -> Result<Vec<PathBuf>, LrecommError> {
        let dir = self.folder_dir(mailbox, folder);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LrecommError::io("list", &dir, e)),
        };

        let mut wavs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LrecommError::io("list", &dir, e))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "wav") && path.is_file() {
                wavs.push(path);
            }
        }
        wavs.sort();
        Ok(wavs)
    }

    /// Move the most recently recorded `INBOX` voicemail to `OUTGOING` under
    /// a fresh `OUTGOING` index. Returns `None` when `INBOX` is empty.
    ///
    /// "Most recent" is by WAV modification time, which the recorder sets
    /// when it finishes writing and which a move between folders keeps.
    pub fn enqueue_latest(&self, mailbox: &MailboxId) -> Result<Option<MovedSlot>, LrecommError> {
        let mut newest: Option<(SystemTime, VoicemailSlot)> = None;
        for slot in self.slots(mailbox, Folder::Inbox)? {
            let created = recorded_time(&slot.wav)?;
            // Ties go to the higher index, which `slots` yields later.
            if newest.as_ref().is_none_or(|(t, _)| created >= *t) {
                newest = Some((created, slot));
            }
        }

        let Some((_, latest)) = newest else {
            info!(mailbox = %mailbox, "no voicemail in INBOX to enqueue");
            return Ok(None);
        };

        let target = self.allocate(mailbox, Folder::Outgoing)?;
        let moved = move_pair(&latest.wav, &target.wav)?;
        info!(
            mailbox = %mailbox,
            from = %latest.file_name(),
            to = %target.file_name(),
            "voicemail enqueued"
        );
        Ok(Some(moved))
    }

    /// Move `slot` to `Old` under a fresh `Old` index.
    pub fn archive_to_old(&self, slot: &VoicemailSlot) -> Result<MovedSlot, LrecommError> {
        let target = self.allocate(&slot.mailbox, Folder::Old)?;
        let moved = move_pair(&slot.wav, &target.wav)?;
        info!(
            mailbox = %slot.mailbox,
            from = %slot.file_name(),
            to = %target.file_name(),
            "voicemail archived to Old"
        );
        Ok(moved)
    }

    /// Move a sent WAV (and sidecar) to `SENT`, keeping its file name. If
    /// that name is already taken in `SENT` the next `SENT` index is used.
    pub fn archive_sent(&self, mailbox: &MailboxId, wav: &Path) -> Result<MovedSlot, LrecommError> {
        let sent = self.ensure_folder(mailbox, Folder::Sent)?;
        let file_name = wav
            .file_name()
            .ok_or_else(|| LrecommError::Internal(format!("{} has no file name", wav.display())))?;

        let mut target = sent.join(file_name);
        if target.exists() || sidecar_path(&target).exists() {
            let fallback = slot_wav_name(next_index(&sent)?);
            debug!(
                mailbox = %mailbox,
                taken = %target.display(),
                fallback = %fallback,
                "SENT name taken, using next index"
            );
            target = sent.join(fallback);
        }

        move_pair(wav, &target)
    }
}

fn recorded_time(path: &Path) -> Result<SystemTime, LrecommError> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| LrecommError::io("read modification time of", path, e))
}

/// Move `from` to `to`, then the sidecar of `from` (if any) to the sidecar of `to`.
///
/// Both destinations must be free. If the sidecar cannot follow, the WAV is
/// moved back so the pair stays together.
pub fn move_pair(from: &Path, to: &Path) -> Result<MovedSlot, LrecommError> {
    let from_sidecar = sidecar_path(from);
    let to_sidecar = sidecar_path(to);
    let has_sidecar = from_sidecar.is_file();
    for target in [Some(to), has_sidecar.then_some(to_sidecar.as_path())].into_iter().flatten() {
        if target.exists() {
            return Err(LrecommError::io(
                "move onto existing",
                target,
                std::io::Error::from(std::io::ErrorKind::AlreadyExists),
            ));
        }
    }

    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LrecommError::io("create directory", parent, e))?;
    }

    move_file(from, to)?;

    let sidecar_moved = if has_sidecar {
        if let Err(e) = move_file(&from_sidecar, &to_sidecar) {
            if let Err(undo) = move_file(to, from) {
                warn!(wav = %to.display(), error = %undo, "failed to move WAV back after sidecar move failed");
            }
            return Err(e);
        }
        true
    } else {
        debug!(wav = %from.display(), "no sidecar to move");
        false
    };

    Ok(MovedSlot {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        sidecar_moved,
    })
}

fn move_file(from: &Path, to: &Path) -> Result<(), LrecommError> {
    if to.exists() {
        return Err(LrecommError::io(
            "move onto existing",
            to,
            std::io::Error::from(std::io::ErrorKind::AlreadyExists),
        ));
    }
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // Rename fails across filesystems; fall back to copy and remove.
    std::fs::copy(from, to).map_err(|e| LrecommError::io("copy", from, e))?;
    std::fs::remove_file(from).map_err(|e| LrecommError::io("remove", from, e))
}
