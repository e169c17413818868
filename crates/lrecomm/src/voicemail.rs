// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot spool commands: `enqueue`, `forward`, and the `notify` hook.

use colored::Colorize;
use lrecomm_bridge::{ForwardReport, ForwardStop, forward_inbox};
use lrecomm_config::LrecommConfig;
use lrecomm_core::{LrecommError, MailboxId};
use lrecomm_spool::Spool;
use tracing::info;

use crate::node::Node;

/// Arguments the PABX passes to its external voicemail notify command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyArgs {
    pub context: String,
    pub mailbox: MailboxId,
    pub new_count: u32,
    pub old_count: u32,
    pub urgent_count: Option<u32>,
}

/// Stage the newest `INBOX` voicemail of `mailbox` for sending.
pub fn run_enqueue(config: &LrecommConfig, mailbox: &MailboxId) -> Result<(), LrecommError> {
    let spool = Spool::new(&config.spool.base_dir, &config.spool.context);
    match spool.enqueue_latest(mailbox)? {
        Some(moved) => println!(
            "{} {} -> {}",
            "enqueued".green(),
            moved.from.display(),
            moved.to.display()
        ),
        None => println!("{}", format!("no voicemail in INBOX for {mailbox}").yellow()),
    }
    Ok(())
}

pub async fn run_forward(config: LrecommConfig, mailbox: &MailboxId) -> Result<ForwardReport, LrecommError> {
    let node = Node::open(config).await?;
    let routes = node.routes.snapshot();
    let report = forward_inbox(&node.spool, &routes, &node.sender, &node.history, mailbox).await?;
    print_report(mailbox, &report);
    Ok(report)
}

/// Forward the mailbox's `INBOX` in the context the PABX names.
pub async fn run_notify(mut config: LrecommConfig, args: &NotifyArgs) -> Result<ForwardReport, LrecommError> {
    info!(
        context = %args.context,
        mailbox = %args.mailbox,
        new = args.new_count,
        old = args.old_count,
        urgent = args.urgent_count.unwrap_or(0),
        "voicemail notify"
    );
    config.spool.context = args.context.clone();
    run_forward(config, &args.mailbox).await
}

fn print_report(mailbox: &MailboxId, report: &ForwardReport) {
    match report.stop {
        ForwardStop::NoRoute => println!("{}", format!("no route for mailbox {mailbox}").yellow()),
        ForwardStop::InboxEmpty => println!(
            "{} {} voicemail(s) from {mailbox}",
            "forwarded".green(),
            report.forwarded
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrecomm_spool::Folder;

    #[test]
    fn enqueue_moves_into_outgoing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LrecommConfig::default();
        config.spool.base_dir = dir.path().to_path_buf();
        let mailbox = MailboxId::from("6001");
        let spool = Spool::new(dir.path(), "default");
        let inbox = spool.ensure_folder(&mailbox, Folder::Inbox).unwrap();
        std::fs::write(inbox.join("msg0000.wav"), b"RIFF").unwrap();

        run_enqueue(&config, &mailbox).unwrap();

        assert!(spool.folder_dir(&mailbox, Folder::Outgoing).join("msg0000.wav").exists());
        assert!(!inbox.join("msg0000.wav").exists());
    }

    #[test]
    fn enqueue_on_empty_inbox_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LrecommConfig::default();
        config.spool.base_dir = dir.path().to_path_buf();
        run_enqueue(&config, &MailboxId::from("6001")).unwrap();
    }
}
