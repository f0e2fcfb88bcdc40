// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a temp SQLite database with a seeded persona
//! and bot binding, plus fixture builders for submissions.

use cytara_core::CytaraError;
use cytara_core::types::MediaType;
use cytara_storage::models::NewSubmission;
use cytara_storage::{Database, queries};
use rand::Rng;
use rand::distributions::Alphanumeric;

/// A temp database seeded with one persona and one ingest bot.
///
/// The temp directory is dropped (and the database deleted) with the
/// harness.
pub struct TestHarness {
    pub db: Database,
    pub persona_id: i64,
    pub bot_token: String,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Build a harness around a persona named `persona_name` with the
    /// given default language.
    pub async fn new(persona_name: &str, language: &str) -> Result<Self, CytaraError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| CytaraError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");
        let db = Database::open(&db_path.to_string_lossy()).await?;

        let persona =
            queries::personas::create_persona(&db, persona_name, None, Some(language)).await?;
        let bot_token = random_token();
        queries::bots::insert_bot_binding(&db, persona.id, &bot_token, "test bot").await?;

        Ok(Self {
            db,
            persona_id: persona.id,
            bot_token,
            _temp_dir: temp_dir,
        })
    }

    /// A text submission fixture from user 111 in chat -100.
    pub fn text_submission(&self, text: &str) -> NewSubmission {
        NewSubmission {
            persona_id: self.persona_id,
            submitted_by_user_id: 111,
            submitted_chat_id: -100,
            submitted_by_username: Some("fixture".to_string()),
            submitted_by_name: Some("Fixture User".to_string()),
            quoted_user_id: None,
            quoted_username: None,
            quoted_name: None,
            media_type: MediaType::Text,
            text_content: Some(text.to_string()),
            file_id: None,
            file_hash: None,
        }
    }

    /// An image submission fixture carrying a platform file reference.
    pub fn image_submission(&self, file_id: &str) -> NewSubmission {
        NewSubmission {
            persona_id: self.persona_id,
            submitted_by_user_id: 111,
            submitted_chat_id: -100,
            submitted_by_username: Some("fixture".to_string()),
            submitted_by_name: None,
            quoted_user_id: None,
            quoted_username: None,
            quoted_name: None,
            media_type: MediaType::Image,
            text_content: None,
            file_id: Some(file_id.to_string()),
            file_hash: None,
        }
    }
}

/// A random 32-character alphanumeric bot token.
pub fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
