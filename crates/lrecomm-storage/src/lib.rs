// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the lrecomm voicemail bridge.
//!
//! Keeps the operator-facing history: known peers, chat lines, voicemails
//! sent and received, and file transfers. The database runs in WAL mode
//! behind a single `tokio-rusqlite` connection with embedded migrations.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
