// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quote rows: creation, random retrieval, and duplicate probes.

use cytara_core::CytaraError;
use cytara_core::types::MediaType;
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, params, params_from_iter};

use crate::database::Database;
use crate::models::{NewQuote, Quote};
use crate::queries::parse_enum_column;

const QUOTE_COLUMNS: &str = "id, persona_id, media_type, text_content, file_id, file_hash, \
     language, created_at, source_submission_id";

fn row_to_quote(row: &rusqlite::Row<'_>) -> rusqlite::Result<Quote> {
    let media_type: String = row.get(2)?;
    Ok(Quote {
        id: row.get(0)?,
        persona_id: row.get(1)?,
        media_type: parse_enum_column(media_type, 2)?,
        text_content: row.get(3)?,
        file_id: row.get(4)?,
        file_hash: row.get(5)?,
        language: row.get(6)?,
        created_at: row.get(7)?,
        source_submission_id: row.get(8)?,
    })
}

/// Per-media-type corpus counts for one persona.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteStats {
    pub total: i64,
    pub text: i64,
    pub image: i64,
    pub audio: i64,
}

/// Insert a new quote row and return it.
pub async fn insert_quote(db: &Database, quote: &NewQuote) -> Result<Quote, CytaraError> {
    let q = quote.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO quotes
                     (persona_id, media_type, text_content, file_id, file_hash,
                      language, source_submission_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    q.persona_id,
                    q.media_type.to_string(),
                    q.text_content,
                    q.file_id,
                    q.file_hash,
                    q.language,
                    q.source_submission_id,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                &format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = ?1"),
                params![id],
                row_to_quote,
            )?;
            Ok(row)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a quote by id.
pub async fn get_quote(db: &Database, id: i64) -> Result<Option<Quote>, CytaraError> {
    db.connection()
        .call(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = ?1"),
                    params![id],
                    row_to_quote,
                )
                .optional()?;
            Ok(row)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete a quote. Returns false when no row matched.
pub async fn delete_quote(db: &Database, id: i64) -> Result<bool, CytaraError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM quotes WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Corpus size for one persona.
pub async fn count_quotes(db: &Database, persona_id: i64) -> Result<i64, CytaraError> {
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM quotes WHERE persona_id = ?1",
                params![persona_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Uniform random quote for a persona. When `languages` is non-empty the
/// draw is limited to those language tags; an empty slice means no filter.
pub async fn random_quote(
    db: &Database,
    persona_id: i64,
    languages: &[String],
) -> Result<Option<Quote>, CytaraError> {
    let languages = languages.to_vec();
    db.connection()
        .call(move |conn| {
            let mut sql = format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE persona_id = ?");
            let mut args: Vec<Value> = vec![Value::Integer(persona_id)];
            if !languages.is_empty() {
                sql.push_str(" AND language IN (");
                sql.push_str(&vec!["?"; languages.len()].join(", "));
                sql.push(')');
                args.extend(languages.into_iter().map(Value::Text));
            }
            sql.push_str(" ORDER BY RANDOM() LIMIT 1");
            let row = conn
                .query_row(&sql, params_from_iter(args), row_to_quote)
                .optional()?;
            Ok(row)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Most recent quotes for one persona, capped at `limit`. This is the
/// candidate pool for relevance ranking; a non-empty `languages` slice
/// restricts the pool to those language tags.
pub async fn recent_quotes(
    db: &Database,
    persona_id: i64,
    languages: &[String],
    limit: i64,
) -> Result<Vec<Quote>, CytaraError> {
    let languages = languages.to_vec();
    db.connection()
        .call(move |conn| {
            let mut sql = format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE persona_id = ?");
            let mut args: Vec<Value> = vec![Value::Integer(persona_id)];
            if !languages.is_empty() {
                sql.push_str(" AND language IN (");
                sql.push_str(&vec!["?"; languages.len()].join(", "));
                sql.push(')');
                args.extend(languages.into_iter().map(Value::Text));
            }
            sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");
            args.push(Value::Integer(limit));
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args), row_to_quote)?;
            let mut quotes = Vec::new();
            for row in rows {
                quotes.push(row?);
            }
            Ok(quotes)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Find an existing quote with the same content hash.
pub async fn find_quote_by_file_hash(
    db: &Database,
    persona_id: i64,
    media_type: MediaType,
    file_hash: &[u8],
) -> Result<Option<Quote>, CytaraError> {
    let file_hash = file_hash.to_vec();
    db.connection()
        .call(move |conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {QUOTE_COLUMNS} FROM quotes
                         WHERE persona_id = ?1 AND media_type = ?2 AND file_hash = ?3
                         LIMIT 1"
                    ),
                    params![persona_id, media_type.to_string(), file_hash],
                    row_to_quote,
                )
                .optional()?;
            Ok(row)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Find an existing quote with the same platform file reference.
pub async fn find_quote_by_file_id(
    db: &Database,
    persona_id: i64,
    media_type: MediaType,
    file_id: &str,
) -> Result<Option<Quote>, CytaraError> {
    let file_id = file_id.to_string();
    db.connection()
        .call(move |conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {QUOTE_COLUMNS} FROM quotes
                         WHERE persona_id = ?1 AND media_type = ?2 AND file_id = ?3
                         LIMIT 1"
                    ),
                    params![persona_id, media_type.to_string(), file_id],
                    row_to_quote,
                )
                .optional()?;
            Ok(row)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Find a text quote whose normalized form equals `normalized`. The
/// normalizer runs in memory over the persona's text quotes; SQLite has no
/// regex support to push the comparison down.
pub async fn find_quote_by_normalized_text(
    db: &Database,
    persona_id: i64,
    media_type: MediaType,
    normalized: String,
    normalize: fn(&str) -> String,
) -> Result<Option<Quote>, CytaraError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {QUOTE_COLUMNS} FROM quotes
                 WHERE persona_id = ?1 AND media_type = ?2 AND text_content IS NOT NULL
                 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![persona_id, media_type.to_string()], row_to_quote)?;
            for row in rows {
                let quote = row?;
                if let Some(text) = &quote.text_content {
                    if normalize(text) == normalized {
                        return Ok(Some(quote));
                    }
                }
            }
            Ok(None)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Per-media counts for one persona.
pub async fn quote_stats(db: &Database, persona_id: i64) -> Result<QuoteStats, CytaraError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT media_type, COUNT(*) FROM quotes
                 WHERE persona_id = ?1 GROUP BY media_type",
            )?;
            let rows = stmt.query_map(params![persona_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            let mut stats = QuoteStats::default();
            for row in rows {
                let (media_type, count) = row?;
                stats.total += count;
                match media_type.as_str() {
                    "text" => stats.text = count,
                    "image" => stats.image = count,
                    "audio" => stats.audio = count,
                    _ => {}
                }
            }
            Ok(stats)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::personas::create_persona;
    use tempfile::tempdir;

    async fn setup_db_with_persona() -> (Database, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let persona = create_persona(&db, "Ada", None, None).await.unwrap();
        (db, persona.id, dir)
    }

    fn text_quote(persona_id: i64, text: &str, language: &str) -> NewQuote {
        NewQuote {
            persona_id,
            media_type: MediaType::Text,
            text_content: Some(text.to_string()),
            file_id: None,
            file_hash: None,
            language: language.to_string(),
            source_submission_id: None,
        }
    }

    #[tokio::test]
    async fn random_quote_respects_language_filter() {
        let (db, persona_id, _dir) = setup_db_with_persona().await;

        insert_quote(&db, &text_quote(persona_id, "bonjour", "fr"))
            .await
            .unwrap();
        insert_quote(&db, &text_quote(persona_id, "hello", "en"))
            .await
            .unwrap();

        for _ in 0..10 {
            let quote = random_quote(&db, persona_id, &["fr".to_string()])
                .await
                .unwrap()
                .unwrap();
            assert_eq!(quote.language, "fr");
        }

        let none = random_quote(&db, persona_id, &["de".to_string()])
            .await
            .unwrap();
        assert!(none.is_none());

        let any = random_quote(&db, persona_id, &[]).await.unwrap();
        assert!(any.is_some());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_probes_match_scoped_rows() {
        let (db, persona_id, _dir) = setup_db_with_persona().await;
        let other = create_persona(&db, "Grace", None, None).await.unwrap();

        let hash = vec![0xAB; 32];
        insert_quote(
            &db,
            &NewQuote {
                persona_id,
                media_type: MediaType::Image,
                text_content: None,
                file_id: Some("file-1".to_string()),
                file_hash: Some(hash.clone()),
                language: "auto".to_string(),
                source_submission_id: None,
            },
        )
        .await
        .unwrap();

        let by_hash = find_quote_by_file_hash(&db, persona_id, MediaType::Image, &hash)
            .await
            .unwrap();
        assert!(by_hash.is_some());

        let wrong_persona = find_quote_by_file_hash(&db, other.id, MediaType::Image, &hash)
            .await
            .unwrap();
        assert!(wrong_persona.is_none());

        let wrong_media = find_quote_by_file_id(&db, persona_id, MediaType::Audio, "file-1")
            .await
            .unwrap();
        assert!(wrong_media.is_none());

        let by_file_id = find_quote_by_file_id(&db, persona_id, MediaType::Image, "file-1")
            .await
            .unwrap();
        assert!(by_file_id.is_some());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn normalized_text_probe_compares_in_memory() {
        let (db, persona_id, _dir) = setup_db_with_persona().await;

        fn squash(s: &str) -> String {
            s.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        }

        insert_quote(&db, &text_quote(persona_id, "Hello, World!", "en"))
            .await
            .unwrap();

        let hit = find_quote_by_normalized_text(
            &db,
            persona_id,
            MediaType::Text,
            squash("hello world"),
            squash,
        )
        .await
        .unwrap();
        assert!(hit.is_some());

        let miss = find_quote_by_normalized_text(
            &db,
            persona_id,
            MediaType::Text,
            squash("goodbye"),
            squash,
        )
        .await
        .unwrap();
        assert!(miss.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn recent_quotes_newest_first_with_language_filter() {
        let (db, persona_id, _dir) = setup_db_with_persona().await;

        for i in 0..5 {
            insert_quote(&db, &text_quote(persona_id, &format!("quote {i}"), "en"))
                .await
                .unwrap();
        }
        insert_quote(&db, &text_quote(persona_id, "bonjour", "fr"))
            .await
            .unwrap();

        let recent = recent_quotes(&db, persona_id, &[], 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].text_content.as_deref(), Some("bonjour"));
        assert_eq!(recent[1].text_content.as_deref(), Some("quote 4"));

        let english = recent_quotes(&db, persona_id, &["en".to_string()], 10)
            .await
            .unwrap();
        assert_eq!(english.len(), 5);
        assert_eq!(english[0].text_content.as_deref(), Some("quote 4"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn stats_count_per_media_type() {
        let (db, persona_id, _dir) = setup_db_with_persona().await;

        insert_quote(&db, &text_quote(persona_id, "a", "en")).await.unwrap();
        insert_quote(&db, &text_quote(persona_id, "b", "en")).await.unwrap();
        insert_quote(
            &db,
            &NewQuote {
                persona_id,
                media_type: MediaType::Audio,
                text_content: None,
                file_id: Some("voice-1".to_string()),
                file_hash: None,
                language: "auto".to_string(),
                source_submission_id: None,
            },
        )
        .await
        .unwrap();

        let stats = quote_stats(&db, persona_id).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.text, 2);
        assert_eq!(stats.audio, 1);
        assert_eq!(stats.image, 0);

        let quote = get_quote(&db, 1).await.unwrap().unwrap();
        assert!(delete_quote(&db, quote.id).await.unwrap());
        assert!(!delete_quote(&db, quote.id).await.unwrap());
        assert_eq!(count_quotes(&db, persona_id).await.unwrap(), 2);

        db.close().await.unwrap();
    }
}
