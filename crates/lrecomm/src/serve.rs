// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lrecomm serve`: the long-running bridge with an operator menu.
//!
//! Spawns the outbound poller, the inbound event loop, and (unless the
//! interval is 0) the announce loop. The menu reads the poller's latest
//! published status; it never touches the poller's state directly.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use lrecomm_bridge::{
    AnnounceHandler, EventDispatcher, InboundHandler, OutboundPoller, PollerStatus, StatusBoard,
    run_announce_loop,
};
use lrecomm_config::{DiscoveredPeers, LrecommConfig, RouteStore};
use lrecomm_core::{LrecommError, MailboxId, PeerAddress};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::node::Node;
use crate::shutdown::install_signal_handler;

/// One operator menu action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    Reload,
    Announce,
    ListDiscovered,
    Assign { peer: String, mailbox: MailboxId },
    Status,
    Help,
    Quit,
}

impl MenuCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(MenuCommand::Status);
        };
        let command = match head {
            "r" => MenuCommand::Reload,
            "a" => MenuCommand::Announce,
            "b" => MenuCommand::ListDiscovered,
            "s" => match (words.next(), words.next()) {
                (Some(peer), Some(mailbox)) => MenuCommand::Assign {
                    peer: peer.to_string(),
                    mailbox: MailboxId::from(mailbox),
                },
                _ => return Err("usage: s <peer number|address> <mailbox>".into()),
            },
            "h" | "?" => MenuCommand::Help,
            "q" => MenuCommand::Quit,
            other => return Err(format!("unknown command `{other}`")),
        };
        Ok(command)
    }
}

/// Resolve a peer chosen from the discovered list, by 1-based number or address.
pub fn pick_discovered(peers: &DiscoveredPeers, choice: &str) -> Option<PeerAddress> {
    if let Ok(n) = choice.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| peers.iter().nth(i)).map(|(addr, _)| *addr);
    }
    let addr: PeerAddress = choice.parse().ok()?;
    peers.get(&addr).map(|_| addr)
}

pub fn status_line(address: &PeerAddress, routes: usize, status: &PollerStatus) -> String {
    let last = status
        .last_cycle
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "node {address} | routes {routes} | pending {} | sent {} | errors {} | last poll {last}",
        status.pending, status.sent, status.errors,
        address = address.pretty(),
    )
}

const MENU_HELP: &str = "r reload routes | a announce | b discovered peers | s <n|addr> <mailbox> assign | q quit";

pub async fn run_serve(config: LrecommConfig, headless: bool) -> Result<(), LrecommError> {
    let cancel = install_signal_handler();
    let node = Node::open(config).await?;
    let config = node.config.clone();
    let status = Arc::new(StatusBoard::new());

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    let poller = OutboundPoller::new(
        node.spool.clone(),
        Arc::clone(&node.routes),
        node.sender.clone(),
        node.history.clone(),
        Arc::clone(&status),
        Duration::from_secs(config.poller.interval_secs),
    );
    let poller_cancel = cancel.clone();
    tasks.push(tokio::spawn(async move { poller.run(poller_cancel).await }));

    let dispatcher = EventDispatcher::new(
        Arc::clone(&node.mesh),
        InboundHandler::new(
            node.spool.clone(),
            Arc::clone(&node.routes),
            node.audio.clone(),
            config.spool.sidecar,
            config.node.received_files_dir.clone(),
            node.history.clone(),
        ),
        AnnounceHandler::new(config.routes.discovered_path.clone(), node.history.clone()),
    );
    let inbound_cancel = cancel.clone();
    let inbound_interval = Duration::from_millis(config.mesh.inbound_poll_interval_ms);
    tasks.push(tokio::spawn(async move { dispatcher.run(inbound_interval, inbound_cancel).await }));

    if config.node.announce_interval_secs > 0 {
        tasks.push(tokio::spawn(run_announce_loop(
            Arc::clone(&node.mesh),
            config.node.display_name.clone(),
            Duration::from_secs(config.node.announce_interval_secs),
            cancel.clone(),
        )));
    } else {
        info!("periodic announces disabled");
    }

    info!(
        address = %node.mesh.local_address().pretty(),
        routes = node.routes.snapshot().len(),
        spool = %config.spool.base_dir.display(),
        "lrecomm serving"
    );

    if headless {
        cancel.cancelled().await;
    } else {
        run_menu(&node, &status, &cancel).await;
        cancel.cancel();
    }

    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "background task ended abnormally");
        }
    }

    if let Some(db) = node.history.database() {
        if let Err(e) = db.clone().close().await {
            warn!(error = %e, "database close failed");
        }
    }
    info!("lrecomm stopped");
    Ok(())
}

/// Read lines on a dedicated thread; the editor blocks on the terminal.
fn spawn_input_thread() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                error!(error = %e, "failed to initialize readline");
                let _ = tx.send("q".to_string());
                return;
            }
        };
        let prompt = format!("{}> ", "lrecomm".green());
        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = rl.add_history_entry(line.as_str());
                    }
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    let _ = tx.send("q".to_string());
                    break;
                }
                Err(e) => {
                    eprintln!("{}: {e}", "error".red());
                    let _ = tx.send("q".to_string());
                    break;
                }
            }
        }
    });
    rx
}

async fn run_menu(node: &Node, status: &StatusBoard, cancel: &CancellationToken) {
    println!("{}", "lrecomm voicemail bridge".bold().green());
    println!("{}", MENU_HELP.dimmed());
    print_status(node, status);

    let mut input = spawn_input_thread();
    loop {
        let line = tokio::select! {
            line = input.recv() => line,
            _ = cancel.cancelled() => break,
        };
        let Some(line) = line else { break };

        let command = match MenuCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{}", message.yellow());
                continue;
            }
        };
        if command == MenuCommand::Quit {
            break;
        }
        handle_menu_command(node, status, command).await;
    }
}

fn print_status(node: &Node, status: &StatusBoard) {
    let line = status_line(
        &node.mesh.local_address(),
        node.routes.snapshot().len(),
        &status.snapshot(),
    );
    println!("{}", line.cyan());
}

async fn handle_menu_command(node: &Node, status: &StatusBoard, command: MenuCommand) {
    match command {
        MenuCommand::Reload => match node.routes.reload() {
            Ok(table) => println!("{} {} route(s)", "reloaded".green(), table.len()),
            Err(e) => eprintln!("{}: {e}", "reload failed".red()),
        },
        MenuCommand::Announce => match node.mesh.announce(&node.config.node.display_name).await {
            Ok(()) => println!("{}", "announce sent".green()),
            Err(e) => eprintln!("{}: {e}", "announce failed".red()),
        },
        MenuCommand::ListDiscovered => list_discovered(&node.config.routes.discovered_path),
        MenuCommand::Assign { peer, mailbox } => {
            assign(&node.routes, &node.config.routes.discovered_path, &peer, mailbox)
        }
        MenuCommand::Status => print_status(node, status),
        MenuCommand::Help => println!("{}", MENU_HELP.dimmed()),
        MenuCommand::Quit => {}
    }
}

fn list_discovered(path: &Path) {
    let peers = match DiscoveredPeers::load(path) {
        Ok(peers) => peers,
        Err(e) => {
            eprintln!("{}: {e}", "error".red());
            return;
        }
    };
    if peers.is_empty() {
        println!("{}", "no peers discovered yet".dimmed());
        return;
    }
    for (n, (addr, peer)) in peers.iter().enumerate() {
        let seen = chrono::DateTime::from_timestamp(peer.last_seen, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("{:>3}. {} {} {}", n + 1, peer.name.bold(), addr.pretty(), seen.dimmed());
    }
}

fn assign(routes: &RouteStore, discovered_path: &Path, choice: &str, mailbox: MailboxId) {
    let peers = match DiscoveredPeers::load(discovered_path) {
        Ok(peers) => peers,
        Err(e) => {
            eprintln!("{}: {e}", "error".red());
            return;
        }
    };
    let Some(peer) = pick_discovered(&peers, choice) else {
        eprintln!("{}", format!("no discovered peer `{choice}`").yellow());
        return;
    };
    match routes.assign(mailbox.clone(), peer) {
        Ok(_) => println!("{} {mailbox} -> {}", "assigned".green(), peer.pretty()),
        Err(e) => eprintln!("{}: {e}", "assign failed".red()),
    }
}
