// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! lrecomm - voicemail and chat bridge between a mesh network and a PABX.
//!
//! This is the binary entry point. `serve` runs the bridge; the remaining
//! subcommands are one-shot tools for the PABX dialplan and the operator.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod chat;
mod node;
mod serve;
mod shutdown;
mod voicemail;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use lrecomm_config::{LrecommConfig, RouteStore};
use lrecomm_core::{LrecommError, MailboxId};

use crate::voicemail::NotifyArgs;

/// lrecomm - voicemail and chat over a mesh network.
#[derive(Parser, Debug)]
#[command(name = "lrecomm", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the XDG lookup.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bridge: outbound poller, inbound delivery, announces.
    Serve {
        /// Run without the operator menu until SIGINT/SIGTERM.
        #[arg(long)]
        headless: bool,
    },
    /// Queue a mailbox's newest INBOX voicemail for sending.
    Enqueue { mailbox: String },
    /// Send every INBOX voicemail of a mailbox to its routed peer.
    Forward { mailbox: String },
    /// Voicemail notify hook: `<context> <mailbox> <new> <old> [urgent]`.
    Notify {
        context: String,
        mailbox: String,
        new_count: u32,
        old_count: u32,
        urgent_count: Option<u32>,
    },
    /// Chat with a peer, or list known peers when none is given.
    Chat {
        /// Peer address (hex) or announced name.
        peer: Option<String>,
    },
    /// Print the mailbox route table.
    Routes,
    /// Print the effective configuration as TOML.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Option<LrecommConfig> {
    let loaded = match path {
        Some(path) => lrecomm_config::load_and_validate_path(path),
        None => lrecomm_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => Some(config),
        Err(errors) => {
            lrecomm_config::render_errors(&errors);
            None
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lrecomm={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn print_routes(config: &LrecommConfig) {
    let store = RouteStore::load(&config.routes.path);
    let table = store.snapshot();
    if table.is_empty() {
        println!("no routes in {}", config.routes.path.display());
        return;
    }
    let mut rows: Vec<_> = table.iter().collect();
    rows.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
    for (mailbox, peer) in rows {
        println!("{:<12} -> {}", mailbox.as_str().bold(), peer.pretty());
    }
}

fn print_config(config: &LrecommConfig) -> Result<(), LrecommError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| LrecommError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

async fn dispatch(command: Commands, config: LrecommConfig) -> Result<(), LrecommError> {
    match command {
        Commands::Serve { headless } => serve::run_serve(config, headless).await,
        Commands::Enqueue { mailbox } => voicemail::run_enqueue(&config, &MailboxId::from(mailbox.as_str())),
        Commands::Forward { mailbox } => {
            voicemail::run_forward(config, &MailboxId::from(mailbox.as_str())).await?;
            Ok(())
        }
        Commands::Notify {
            context,
            mailbox,
            new_count,
            old_count,
            urgent_count,
        } => {
            let args = NotifyArgs {
                context,
                mailbox: MailboxId::from(mailbox.as_str()),
                new_count,
                old_count,
                urgent_count,
            };
            voicemail::run_notify(config, &args).await?;
            Ok(())
        }
        Commands::Chat { peer } => chat::run_chat(config, peer).await,
        Commands::Routes => {
            print_routes(&config);
            Ok(())
        }
        Commands::Config => print_config(&config),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(config) = load_config(cli.config.as_ref()) else {
        return ExitCode::FAILURE;
    };
    init_tracing(&config.node.log_level);

    match dispatch(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn notify_accepts_optional_urgent_count() {
        let cli = Cli::try_parse_from(["lrecomm", "notify", "default", "1000", "2", "5"]).unwrap();
        match cli.command {
            Commands::Notify {
                context,
                mailbox,
                new_count,
                old_count,
                urgent_count,
            } => {
                assert_eq!(context, "default");
                assert_eq!(mailbox, "1000");
                assert_eq!((new_count, old_count, urgent_count), (2, 5, None));
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["lrecomm", "notify", "default", "1000", "2", "5", "1"]).unwrap();
        assert!(matches!(cli.command, Commands::Notify { urgent_count: Some(1), .. }));
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["lrecomm", "serve", "--headless", "--config", "/etc/lrecomm.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/lrecomm.toml")));
        assert!(matches!(cli.command, Commands::Serve { headless: true }));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["lrecomm"]).is_err());
        assert!(Cli::try_parse_from(["lrecomm", "notify", "default"]).is_err());
    }

    #[test]
    fn default_config_renders_as_toml() {
        let config = lrecomm_config::load_and_validate_str("").expect("default config should be valid");
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("[spool]"));
        let reparsed = lrecomm_config::load_and_validate_str(&rendered).expect("rendered config should load");
        assert_eq!(reparsed.spool.context, config.spool.context);
    }
}
