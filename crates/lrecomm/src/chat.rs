// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lrecomm chat`: terminal conversation with one peer.
//!
//! History comes from the store, so lines received by a running
//! `lrecomm serve` appear on refresh (an empty line).

use std::path::PathBuf;

use colored::Colorize;
use lrecomm_bridge::{CHAT_TITLE, History};
use lrecomm_config::LrecommConfig;
use lrecomm_core::{LrecommError, PeerAddress};
use lrecomm_storage::queries::{identities, messages};
use lrecomm_storage::{Align, ChatLine, Direction};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::node::{Node, open_history};

const LINE_WIDTH: usize = 72;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Quit,
    Refresh,
    File(PathBuf),
    Voice(PathBuf),
    Text(String),
    Invalid(String),
}

impl ChatInput {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return ChatInput::Refresh;
        }
        let Some(rest) = trimmed.strip_prefix('/') else {
            return ChatInput::Text(trimmed.to_string());
        };
        let (command, arg) = match rest.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (rest, ""),
        };
        match (command, arg.is_empty()) {
            ("quit" | "exit", _) => ChatInput::Quit,
            ("file", false) => ChatInput::File(PathBuf::from(arg)),
            ("voice", false) => ChatInput::Voice(PathBuf::from(arg)),
            ("file" | "voice", true) => ChatInput::Invalid(format!("usage: /{command} <path>")),
            _ => ChatInput::Invalid(format!("unknown command /{command}")),
        }
    }
}

/// One history line, right-aligned when this node sent it.
pub fn render_line(line: &ChatLine) -> String {
    let time = chrono::DateTime::from_timestamp(line.time, 0)
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M").to_string())
        .unwrap_or_default();
    let text = format!("[{time}] {}", line.content);
    match line.align() {
        Align::Right => format!("{text:>LINE_WIDTH$}"),
        Align::Left => text,
    }
}

/// A peer given as an address, or the name of a known identity.
pub async fn resolve_target(history: &History, target: &str) -> Result<(PeerAddress, Option<String>), LrecommError> {
    if let Ok(addr) = target.parse::<PeerAddress>() {
        let name = match history.database() {
            Some(db) => identities::get_identity(db, &addr.to_string()).await?.map(|i| i.name),
            None => None,
        };
        return Ok((addr, name));
    }

    let db = history
        .database()
        .ok_or_else(|| LrecommError::Config(format!("`{target}` is not an address and no history store is available")))?;
    let identity = identities::find_by_name(db, target)
        .await?
        .ok_or_else(|| LrecommError::Config(format!("no known peer named `{target}`")))?;
    let addr = identity.destination.parse()?;
    Ok((addr, Some(identity.name)))
}

pub async fn run_chat(config: LrecommConfig, target: Option<String>) -> Result<(), LrecommError> {
    let Some(target) = target else {
        let history = open_history(&config.storage.database_path).await;
        return list_identities(&history).await;
    };

    let node = Node::open(config).await?;
    let (peer, name) = resolve_target(&node.history, &target).await?;
    let label = name.unwrap_or_else(|| peer.pretty());

    let mut rl = DefaultEditor::new()
        .map_err(|e| LrecommError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{} {}", "chat with".bold().green(), label.bold());
    println!(
        "Type {} to send, {} or {} to attach, empty line to refresh, {} to exit.\n",
        "text".yellow(),
        "/file <path>".yellow(),
        "/voice <wav>".yellow(),
        "/quit".yellow()
    );
    show_history(&node.history, &peer).await;

    let prompt = format!("{}> ", "lrecomm".green());
    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        let input = ChatInput::parse(&line);
        if !matches!(input, ChatInput::Refresh) {
            let _ = rl.add_history_entry(line.as_str());
        }

        let result = match input {
            ChatInput::Quit => break,
            ChatInput::Refresh => {
                show_history(&node.history, &peer).await;
                Ok(())
            }
            ChatInput::Invalid(message) => {
                eprintln!("{}", message.yellow());
                Ok(())
            }
            ChatInput::Text(text) => send_text(&node, &peer, &text).await,
            ChatInput::File(path) => send_file(&node, &peer, path).await,
            ChatInput::Voice(wav) => send_voice(&node, &peer, &wav).await,
        };
        if let Err(e) = result {
            eprintln!("{}: {e}", "error".red());
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}

async fn send_text(node: &Node, peer: &PeerAddress, text: &str) -> Result<(), LrecommError> {
    node.sender.send_text(peer, text).await?;
    node.history.message_sent(peer, text).await;
    println!("{}", render_line(&ChatLine {
        content: text.to_string(),
        time: lrecomm_core::unix_now(),
        outgoing: true,
    }).green());
    Ok(())
}

async fn send_file(node: &Node, peer: &PeerAddress, path: PathBuf) -> Result<(), LrecommError> {
    node.sender.send_files(peer, std::slice::from_ref(&path)).await?;
    node.history.file_transferred(Direction::Sent, peer, &path).await;
    println!("{} {}", "sent file".green(), path.display());
    Ok(())
}

async fn send_voice(node: &Node, peer: &PeerAddress, wav: &std::path::Path) -> Result<(), LrecommError> {
    node.sender.send_voicemail(peer, wav, CHAT_TITLE).await?;
    node.history.voicemail_sent(peer, wav).await;
    println!("{} {}", "sent voice message".green(), wav.display());
    Ok(())
}

async fn show_history(history: &History, peer: &PeerAddress) {
    let Some(db) = history.database() else {
        println!("{}", "history unavailable".dimmed());
        return;
    };
    match messages::conversation(db, peer).await {
        Ok(lines) if lines.is_empty() => println!("{}", "no messages yet".dimmed()),
        Ok(lines) => {
            for line in &lines {
                let rendered = render_line(line);
                if line.outgoing {
                    println!("{}", rendered.green());
                } else {
                    println!("{}", rendered.cyan());
                }
            }
        }
        Err(e) => eprintln!("{}: {e}", "error".red()),
    }
}

async fn list_identities(history: &History) -> Result<(), LrecommError> {
    let Some(db) = history.database() else {
        return Err(LrecommError::Config("history store unavailable".into()));
    };
    let known = identities::list_identities(db).await?;
    if known.is_empty() {
        println!("{}", "no known peers; run `lrecomm serve` to hear announces".dimmed());
        return Ok(());
    }
    for identity in known {
        println!("{:<24} <{}>", identity.name.bold(), identity.destination);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrecomm_storage::{Database, Identity};

    #[test]
    fn chat_input_parsing() {
        assert_eq!(ChatInput::parse("  "), ChatInput::Refresh);
        assert_eq!(ChatInput::parse("/quit"), ChatInput::Quit);
        assert_eq!(ChatInput::parse("hello there"), ChatInput::Text("hello there".into()));
        assert_eq!(ChatInput::parse("/file ./map.png"), ChatInput::File("./map.png".into()));
        assert_eq!(ChatInput::parse("/voice  note.wav "), ChatInput::Voice("note.wav".into()));
        assert!(matches!(ChatInput::parse("/file"), ChatInput::Invalid(_)));
        assert!(matches!(ChatInput::parse("/dance"), ChatInput::Invalid(_)));
    }

    #[test]
    fn sent_lines_are_right_aligned() {
        let sent = render_line(&ChatLine {
            content: "hi".into(),
            time: 0,
            outgoing: true,
        });
        let received = render_line(&ChatLine {
            content: "hi".into(),
            time: 0,
            outgoing: false,
        });
        assert_eq!(sent.chars().count(), LINE_WIDTH);
        assert!(sent.starts_with(' '));
        assert!(received.starts_with('['));
        assert!(received.ends_with("] hi"));
    }

    #[tokio::test]
    async fn target_by_address_or_name() {
        let db = Database::open_in_memory().await.unwrap();
        let addr = PeerAddress::from_bytes([0x5a; 16]);
        identities::upsert_identity(
            &db,
            &Identity {
                destination: addr.to_string(),
                identity_hash: None,
                name: "Ridge".into(),
                username: None,
                last_seen: 1,
            },
        )
        .await
        .unwrap();
        let history = History::new(db);

        let (by_name, name) = resolve_target(&history, "ridge").await.unwrap();
        assert_eq!(by_name, addr);
        assert_eq!(name.as_deref(), Some("Ridge"));

        let (by_addr, name) = resolve_target(&history, &addr.pretty()).await.unwrap();
        assert_eq!(by_addr, addr);
        assert_eq!(name.as_deref(), Some("Ridge"));

        assert!(resolve_target(&history, "nobody").await.is_err());
        assert!(resolve_target(&History::disabled(), "Ridge").await.is_err());
    }
}
