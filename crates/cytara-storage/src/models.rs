// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage entity types.
//!
//! The canonical row types live in `cytara-core::types` for use across
//! crate boundaries; this module re-exports them and adds the insert-side
//! input structs.

use cytara_core::types::MediaType;

pub use cytara_core::types::{
    BotBinding, ModerationAction, ModerationStatus, Persona, PersonaIdentity, Quote, Submission,
};

/// Input for a new submission row. `created_at` and `status` are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewSubmission {
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
    pub file_hash: Option<Vec<u8>>,
}

/// Input for a new identity row. `added_at` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub persona_id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub added_by_user_id: Option<i64>,
    pub added_in_chat_id: Option<i64>,
}

/// Input for a new quote row.
#[derive(Debug, Clone)]
pub struct NewQuote {
    pub persona_id: i64,
    pub media_type: MediaType,
    pub text_content: Option<String>,
    pub file_id: Option<String>,
    pub file_hash: Option<Vec<u8>>,
    pub language: String,
    pub source_submission_id: Option<i64>,
}
