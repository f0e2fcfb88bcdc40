// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. All failures are collected; validation does not fail fast.

use crate::diagnostic::ConfigError;
use crate::model::CytaraConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &CytaraConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.ingest.rate_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "ingest.rate_limit must be at least 1".to_string(),
        });
    }

    if config.ingest.rate_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "ingest.rate_interval_secs must be at least 1".to_string(),
        });
    }

    if config.retrieval.search_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "retrieval.search_limit must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
