// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Cytara workspace.
//!
//! All timestamps are RFC 3339 strings; SQLite stores them as TEXT and
//! ordering comparisons work lexicographically.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of payload a submission or quote carries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Text,
    Image,
    Audio,
}

/// Moderation state of a submission. `Pending` is the only non-terminal state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Which duplicate-detection rule fired. Ordered strongest to weakest:
/// content hash, platform file reference, normalized text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DuplicateReason {
    FileHash,
    FileId,
    Text,
}

/// A named, language-tagged identity a quote corpus is attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: i64,
    /// Unique across the platform (case-insensitive).
    pub name: String,
    pub description: Option<String>,
    /// Concrete ISO-like code, or the sentinel `"auto"`.
    pub language: String,
    pub created_at: String,
    pub is_active: bool,
}

/// A registered author fingerprint bound to a persona.
///
/// At least one of `user_id`, `username`, `display_name` is populated.
/// Removal is a soft delete: the row survives with `removed_at` set, and
/// re-adding an equivalent identity clears the removal metadata again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaIdentity {
    pub id: i64,
    pub persona_id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub added_by_user_id: Option<i64>,
    pub added_in_chat_id: Option<i64>,
    pub added_at: String,
    pub removed_at: Option<String>,
    pub removed_by_user_id: Option<i64>,
    pub removed_in_chat_id: Option<i64>,
}

impl PersonaIdentity {
    pub fn is_active(&self) -> bool {
        self.removed_at.is_none()
    }
}

/// A candidate quote awaiting a moderation decision.
///
/// The `quoted_*` fields hold the original author of a forwarded or quoted
/// message; when any of them is set, identity verification compares that
/// author instead of the submitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub persona_id: i64,
    pub submitted_by_user_id: i64,
    pub submitted_chat_id: i64,
    pub submitted_by_username: Option<String>,
    pub submitted_by_name: Option<String>,
    pub quoted_user_id: Option<i64>,
    pub quoted_username: Option<String>,
    pub quoted_name: Option<String>,
    pub media_type: MediaType,
    pub text_content: Option<String>,
    pub file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<Vec<u8>>,
    pub status: ModerationStatus,
    pub created_at: String,
    pub decided_at: Option<String>,
    pub decided_by_user_id: Option<i64>,
    pub decided_in_chat_id: Option<i64>,
    pub rejection_reason: Option<String>,
}

/// A moderated, retrievable corpus entry. Created only via approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub persona_id: i64,
    pub media_type: MediaType,
    pub text_content: Option<String>,
    pub file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<Vec<u8>>,
    /// Inherited from the persona at approval time unless overridden.
    pub language: String,
    pub created_at: String,
    pub source_submission_id: Option<i64>,
}

/// Immutable audit record of a moderation decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationAction {
    pub id: i64,
    pub submission_id: i64,
    pub performed_by_user_id: Option<i64>,
    pub admin_chat_id: Option<i64>,
    pub action: ModerationStatus,
    pub created_at: String,
    pub notes: Option<String>,
}

/// An active ingest bot binding a platform token to a persona.
///
/// Read side only: bot CRUD belongs to the administrative boundary. The
/// gateway's token cache is built from these rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotBinding {
    pub bot_id: i64,
    pub persona_id: i64,
    pub api_token: String,
    pub display_name: String,
}
