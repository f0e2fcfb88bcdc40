// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Cytara quote platform.

use thiserror::Error;

use crate::types::ModerationStatus;

/// The primary error type used across all Cytara crates.
///
/// Absence of a record is not an error anywhere in the platform: lookups
/// return `Option` and searches return empty vectors. The variants below
/// cover the cases that genuinely abort an operation.
#[derive(Debug, Error)]
pub enum CytaraError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Malformed submission payload, rejected at intake and never persisted.
    #[error("invalid submission: {0}")]
    Validation(String),

    /// Approval attempted on a submission whose author matches no registered
    /// identity. The message carries the reviewer-facing diagnostic, including
    /// the nearest partial-match overlap when one exists.
    #[error("identity requirement not met: {0}")]
    IdentityMismatch(String),

    /// An operation that needs a specific record was given an id that does
    /// not exist. Plain lookups return `Option` instead.
    #[error("{0} not found")]
    NotFound(String),

    /// A decision raced with another operator: the submission already left
    /// the pending state. The caller should re-fetch the next pending item.
    #[error("submission already decided (status: {status})")]
    AlreadyDecided { status: ModerationStatus },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
