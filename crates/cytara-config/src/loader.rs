// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./cytara.toml` > `~/.config/cytara/cytara.toml`
//! > `/etc/cytara/cytara.toml` with environment variable overrides via the
//! `CYTARA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CytaraConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/cytara/cytara.toml` (system-wide)
/// 3. `~/.config/cytara/cytara.toml` (user XDG config)
/// 4. `./cytara.toml` (local directory)
/// 5. `CYTARA_*` environment variables
pub fn load_config() -> Result<CytaraConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CytaraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CytaraConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CytaraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CytaraConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CytaraConfig::default()))
        .merge(Toml::file("/etc/cytara/cytara.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("cytara/cytara.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("cytara.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `CYTARA_STORAGE_DATABASE_PATH` must map
/// to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("CYTARA_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("platform_", "platform.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("ingest_", "ingest.", 1)
            .replacen("retrieval_", "retrieval.", 1);
        mapped.into()
    })
}
