// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exact-duplicate detection at approval time.
//!
//! Three probes in strict priority order: content hash, platform file
//! reference, normalized text. The first hit wins and carries the rule
//! that fired so moderators see why the payload was recognized.

use cytara_core::CytaraError;
use cytara_core::types::{DuplicateReason, MediaType};
use cytara_storage::models::Quote;
use cytara_storage::{Database, queries};
use tracing::debug;

use crate::ranking::normalize_quote_text;

/// Look for an existing quote with the same payload, scoped to one
/// persona and media kind. `None` is the expected majority outcome.
pub async fn find_exact_duplicate(
    db: &Database,
    persona_id: i64,
    media_type: MediaType,
    text_content: Option<&str>,
    file_id: Option<&str>,
    file_hash: Option<&[u8]>,
) -> Result<Option<(Quote, DuplicateReason)>, CytaraError> {
    if let Some(hash) = file_hash.filter(|h| !h.is_empty()) {
        if let Some(quote) =
            queries::quotes::find_quote_by_file_hash(db, persona_id, media_type, hash).await?
        {
            debug!(persona_id, quote_id = quote.id, "duplicate by file hash");
            return Ok(Some((quote, DuplicateReason::FileHash)));
        }
    }

    if let Some(file_id) = file_id.map(str::trim).filter(|f| !f.is_empty()) {
        if let Some(quote) =
            queries::quotes::find_quote_by_file_id(db, persona_id, media_type, file_id).await?
        {
            debug!(persona_id, quote_id = quote.id, "duplicate by file id");
            return Ok(Some((quote, DuplicateReason::FileId)));
        }
    }

    let normalized = normalize_quote_text(text_content.unwrap_or(""));
    if !normalized.is_empty() {
        if let Some(quote) = queries::quotes::find_quote_by_normalized_text(
            db,
            persona_id,
            media_type,
            normalized,
            normalize_quote_text,
        )
        .await?
        {
            debug!(persona_id, quote_id = quote.id, "duplicate by text");
            return Ok(Some((quote, DuplicateReason::Text)));
        }
    }

    Ok(None)
}
