// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Cytara quote platform.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Cytara configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CytaraConfig {
    /// Platform identity and logging settings.
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Gateway HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Ingestion admission-control settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Quote retrieval settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Platform identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Display name of the platform instance.
    #[serde(default = "default_platform_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            name: default_platform_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_platform_name() -> String {
    "cytara".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Whether to enable WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    "cytara.db".to_string()
}

fn default_true() -> bool {
    true
}

/// Gateway HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Ingestion admission-control configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Maximum submissions admitted per chat within one interval.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: usize,

    /// Sliding-window interval in seconds.
    #[serde(default = "default_rate_interval")]
    pub rate_interval_secs: u64,

    /// TTL of the bot-token cache in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_cache_ttl_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            rate_limit: default_rate_limit(),
            rate_interval_secs: default_rate_interval(),
            token_cache_ttl_secs: default_token_ttl(),
        }
    }
}

fn default_rate_limit() -> usize {
    5
}

fn default_rate_interval() -> u64 {
    1
}

fn default_token_ttl() -> u64 {
    60
}

/// Quote retrieval configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// How many ranked quotes a relevance search returns.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Minimum candidate-pool size a search scans.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            sample_size: default_sample_size(),
        }
    }
}

fn default_search_limit() -> usize {
    5
}

fn default_sample_size() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CytaraConfig::default();
        assert_eq!(config.platform.name, "cytara");
        assert_eq!(config.storage.database_path, "cytara.db");
        assert!(config.storage.wal_mode);
        assert_eq!(config.ingest.rate_limit, 5);
        assert_eq!(config.ingest.rate_interval_secs, 1);
        assert_eq!(config.ingest.token_cache_ttl_secs, 60);
        assert_eq!(config.retrieval.search_limit, 5);
        assert_eq!(config.retrieval.sample_size, 50);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml_str = r#"
[platform]
name = "test"
unknown_field = 1
"#;
        assert!(toml::from_str::<CytaraConfig>(toml_str).is_err());
    }
}
