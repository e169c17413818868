// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./lrecomm.toml` > `~/.config/lrecomm/lrecomm.toml` > `/etc/lrecomm/lrecomm.toml`
//! with environment variable overrides via `LRECOMM_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LrecommConfig;

/// Config file name searched in each layer.
pub const CONFIG_FILE_NAME: &str = "lrecomm.toml";

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/lrecomm/lrecomm.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/lrecomm/lrecomm.toml` (system-wide)
/// 3. `~/.config/lrecomm/lrecomm.toml` (user XDG config)
/// 4. `./lrecomm.toml` (local directory)
/// 5. `LRECOMM_*` environment variables
pub fn load_config() -> Result<LrecommConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<LrecommConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LrecommConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LrecommConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LrecommConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LrecommConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("lrecomm").join(CONFIG_FILE_NAME))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Environment variable provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `LRECOMM_MESH_PATH_TIMEOUT_SECS` must map to
/// `mesh.path_timeout_secs`, not `mesh.path.timeout.secs`.
fn env_provider() -> Env {
    Env::prefixed("LRECOMM_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("node_", "node.", 1)
            .replacen("spool_", "spool.", 1)
            .replacen("routes_", "routes.", 1)
            .replacen("poller_", "poller.", 1)
            .replacen("codec_", "codec.", 1)
            .replacen("mesh_", "mesh.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_map_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("LRECOMM_MESH_PATH_TIMEOUT_SECS", "7");
            jail.set_env("LRECOMM_SPOOL_CONTEXT", "office");
            jail.set_env("LRECOMM_NODE_DISPLAY_NAME", "Relay");

            let config: LrecommConfig = Figment::new()
                .merge(Serialized::defaults(LrecommConfig::default()))
                .merge(env_provider())
                .extract()?;

            assert_eq!(config.mesh.path_timeout_secs, 7);
            assert_eq!(config.spool.context, "office");
            assert_eq!(config.node.display_name, "Relay");
            Ok(())
        });
    }

    #[test]
    fn explicit_path_is_loaded() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
[poller]
interval_secs = 11
"#,
            )?;
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.poller.interval_secs, 11);
            Ok(())
        });
    }
}
