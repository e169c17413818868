// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Folder transitions across a whole mailbox.

use std::path::Path;
use std::time::{Duration, SystemTime};

use lrecomm_core::MailboxId;
use lrecomm_spool::{Folder, Spool, sidecar_path};

fn touch(path: &Path, body: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

#[test]
fn enqueue_assigns_outgoing_scoped_index() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::new(dir.path(), "default");
    let mailbox = MailboxId::from("6001");
    let inbox = spool.folder_dir(&mailbox, Folder::Inbox);
    touch(&inbox.join("msg0000.wav"), b"first");

    let moved = spool.enqueue_latest(&mailbox).unwrap().unwrap();

    let outgoing = spool.folder_dir(&mailbox, Folder::Outgoing);
    assert_eq!(moved.to, outgoing.join("msg0000.wav"));
    assert_eq!(std::fs::read(outgoing.join("msg0000.wav")).unwrap(), b"first");
    assert!(!inbox.join("msg0000.wav").exists());
}

#[test]
fn enqueue_discards_inbox_index() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::new(dir.path(), "default");
    let mailbox = MailboxId::from("6001");
    let inbox = spool.folder_dir(&mailbox, Folder::Inbox);
    let outgoing = spool.folder_dir(&mailbox, Folder::Outgoing);
    touch(&inbox.join("msg0007.wav"), b"wav");
    touch(&inbox.join("msg0007.txt"), b"meta");
    touch(&outgoing.join("msg0000.wav"), b"queued");

    let moved = spool.enqueue_latest(&mailbox).unwrap().unwrap();

    assert_eq!(moved.to, outgoing.join("msg0001.wav"));
    assert!(moved.sidecar_moved);
    assert_eq!(std::fs::read(outgoing.join("msg0001.txt")).unwrap(), b"meta");
}

#[test]
fn enqueue_picks_newest_recording_not_highest_index() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::new(dir.path(), "default");
    let mailbox = MailboxId::from("6001");
    let inbox = spool.folder_dir(&mailbox, Folder::Inbox);
    touch(&inbox.join("msg0000.wav"), b"newer");
    touch(&inbox.join("msg0001.wav"), b"older");
    std::fs::File::options()
        .write(true)
        .open(inbox.join("msg0000.wav"))
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(3600))
        .unwrap();

    let moved = spool.enqueue_latest(&mailbox).unwrap().unwrap();

    assert_eq!(moved.from, inbox.join("msg0000.wav"));
    let outgoing = spool.folder_dir(&mailbox, Folder::Outgoing);
    assert_eq!(std::fs::read(outgoing.join("msg0000.wav")).unwrap(), b"newer");
    assert!(inbox.join("msg0001.wav").exists());
}

#[test]
fn enqueue_skips_index_held_by_stale_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::new(dir.path(), "default");
    let mailbox = MailboxId::from("6001");
    let inbox = spool.folder_dir(&mailbox, Folder::Inbox);
    let outgoing = spool.folder_dir(&mailbox, Folder::Outgoing);
    touch(&inbox.join("msg0000.wav"), b"wav");
    touch(&inbox.join("msg0000.txt"), b"meta");
    touch(&outgoing.join("msg0000.txt"), b"STALE");

    let moved = spool.enqueue_latest(&mailbox).unwrap().unwrap();

    assert_eq!(moved.to, outgoing.join("msg0001.wav"));
    assert!(moved.sidecar_moved);
    assert_eq!(std::fs::read(outgoing.join("msg0001.txt")).unwrap(), b"meta");
    assert_eq!(std::fs::read(outgoing.join("msg0000.txt")).unwrap(), b"STALE");
    assert!(!inbox.join("msg0000.txt").exists());
}

#[test]
fn enqueue_on_empty_inbox_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::new(dir.path(), "default");
    assert!(spool.enqueue_latest(&MailboxId::from("6001")).unwrap().is_none());
}

#[test]
fn forward_moves_oldest_to_old_with_new_index() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::new(dir.path(), "default");
    let mailbox = MailboxId::from("6002");
    let inbox = spool.folder_dir(&mailbox, Folder::Inbox);
    let old = spool.folder_dir(&mailbox, Folder::Old);
    touch(&inbox.join("msg0003.wav"), b"three");
    touch(&inbox.join("msg0005.wav"), b"five");
    touch(&old.join("msg0010.wav"), b"archived");

    let oldest = spool.oldest(&mailbox, Folder::Inbox).unwrap().unwrap();
    let moved = spool.archive_to_old(&oldest).unwrap();

    assert_eq!(moved.to, old.join("msg0011.wav"));
    assert_eq!(std::fs::read(&moved.to).unwrap(), b"three");
    assert!(!moved.sidecar_moved);
    assert_eq!(spool.slots(&mailbox, Folder::Inbox).unwrap().len(), 1);
}

#[test]
fn archive_sent_preserves_name_and_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::new(dir.path(), "default");
    let mailbox = MailboxId::from("6001");
    let outgoing = spool.folder_dir(&mailbox, Folder::Outgoing);
    let wav = outgoing.join("msg0002.wav");
    touch(&wav, b"wav");
    touch(&sidecar_path(&wav), b"meta");

    let moved = spool.archive_sent(&mailbox, &wav).unwrap();

    let sent = spool.folder_dir(&mailbox, Folder::Sent);
    assert_eq!(moved.to, sent.join("msg0002.wav"));
    assert!(sent.join("msg0002.txt").is_file());
    assert!(spool.pending_wavs(&mailbox, Folder::Outgoing).unwrap().is_empty());
}
