// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quote materialization and retrieval over storage.

use cytara_core::CytaraError;
use cytara_storage::models::{NewQuote, Quote, Submission};
use cytara_storage::queries::quotes::QuoteStats;
use cytara_storage::{Database, queries};
use tracing::{info, warn};

use crate::ranking::{language_pool_for, prepare_language_priority};

/// Materialize a quote from an approved submission. The language falls
/// back from the explicit override to the persona's language to `"auto"`.
pub async fn create_quote_from_submission(
    db: &Database,
    submission: &Submission,
    persona_language: &str,
    override_language: Option<&str>,
) -> Result<Quote, CytaraError> {
    let language = override_language
        .filter(|l| !l.is_empty())
        .unwrap_or(persona_language);
    let language = if language.is_empty() { "auto" } else { language };

    let quote = queries::quotes::insert_quote(
        db,
        &NewQuote {
            persona_id: submission.persona_id,
            media_type: submission.media_type,
            text_content: submission.text_content.clone(),
            file_id: submission.file_id.clone(),
            file_hash: submission.file_hash.clone(),
            language: language.to_string(),
            source_submission_id: Some(submission.id),
        },
    )
    .await?;
    info!(
        quote_id = quote.id,
        submission_id = submission.id,
        "quote created from submission"
    );
    Ok(quote)
}

/// Uniform random draw honoring a language priority, with `"auto"`
/// always admitted alongside the priority languages.
pub async fn random_quote(
    db: &Database,
    persona_id: i64,
    language_priority: &[String],
) -> Result<Option<Quote>, CytaraError> {
    let prepared = prepare_language_priority(language_priority);
    let pool = language_pool_for(&prepared);
    queries::quotes::random_quote(db, persona_id, &pool).await
}

/// Operator removal of a quote. Destructive, so it is logged at warn.
pub async fn delete_quote(db: &Database, quote_id: i64) -> Result<bool, CytaraError> {
    let deleted = queries::quotes::delete_quote(db, quote_id).await?;
    if deleted {
        warn!(quote_id, "quote deleted");
    }
    Ok(deleted)
}

/// Corpus size for one persona.
pub async fn count_quotes(db: &Database, persona_id: i64) -> Result<i64, CytaraError> {
    queries::quotes::count_quotes(db, persona_id).await
}

/// Per-media corpus breakdown for one persona.
pub async fn quote_stats(db: &Database, persona_id: i64) -> Result<QuoteStats, CytaraError> {
    queries::quotes::quote_stats(db, persona_id).await
}
