// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per history table pair.

pub mod files;
pub mod identities;
pub mod messages;
pub mod voicemails;
