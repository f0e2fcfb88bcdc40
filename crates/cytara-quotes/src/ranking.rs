// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lexical relevance ranking over a persona's quote corpus.
//!
//! Scoring is corpus-independent: every component of the score is a 0-1
//! value computed from the query and one candidate alone, so a quote's
//! score never shifts as the corpus grows.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use cytara_core::CytaraError;
use cytara_storage::models::Quote;
use cytara_storage::{Database, queries};
use regex::Regex;
use tracing::{debug, info};

/// Word-like runs: letters (Unicode, so diacritics count), digits,
/// apostrophes.
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w']+").expect("word pattern compiles"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Polish and English function words that carry no relevance signal.
const STOP_WORDS: &[&str] = &[
    "a", "ale", "and", "czy", "dla", "do", "i", "is", "jest", "na", "nie", "o", "of", "or",
    "oraz", "się", "the", "to", "w", "z",
];

/// Split text into lowercase word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Drop stop words, unless doing so would leave nothing to compare.
fn filter_stop_words(tokens: &[String]) -> Vec<String> {
    let meaningful: Vec<String> = tokens
        .iter()
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .cloned()
        .collect();
    if meaningful.is_empty() {
        tokens.to_vec()
    } else {
        meaningful
    }
}

/// Lowercase, trim, and collapse whitespace runs for equality checks.
pub fn normalize_quote_text(text: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(text, " ");
    collapsed.trim().to_lowercase()
}

/// Normalize a caller-supplied language priority list: lowercase, strip
/// region subtags (`pl-PL` becomes `pl`), drop empties, dedup preserving
/// order.
pub fn prepare_language_priority(language_priority: &[String]) -> Vec<String> {
    let mut prepared = Vec::new();
    let mut seen = HashSet::new();
    for language in language_priority {
        if language.is_empty() {
            continue;
        }
        let mut normalized = language.to_lowercase();
        if let Some(idx) = normalized.find('-') {
            normalized.truncate(idx);
        }
        if seen.insert(normalized.clone()) {
            prepared.push(normalized);
        }
    }
    prepared
}

/// Total length of matching blocks between two char sequences, in the
/// Ratcliff/Obershelp manner: find the longest common substring, then
/// recurse on the pieces to its left and right.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut best_len = 0;
    let mut best_a = 0;
    let mut best_b = 0;
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut curr = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let len = prev[j] + 1;
                curr[j + 1] = len;
                if len > best_len {
                    best_len = len;
                    best_a = i + 1 - len;
                    best_b = j + 1 - len;
                }
            }
        }
        prev = curr;
    }
    if best_len == 0 {
        return 0;
    }
    best_len
        + matching_chars(&a[..best_a], &b[..best_b])
        + matching_chars(&a[best_a + best_len..], &b[best_b + best_len..])
}

/// Character-sequence similarity on a 0-1 scale: twice the matched
/// character count over the combined length.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn token_counts(tokens: &[String]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Relevance of one candidate token list against a query token list.
///
/// `0.55·coverage + 0.25·jaccard + 0.15·sequence_ratio +
/// 0.05·length_penalty`, every component on 0-1. Identical lists score
/// exactly 1.0.
pub fn score_tokens(query_tokens: &[String], candidate_tokens: &[String]) -> f64 {
    if query_tokens.is_empty() || candidate_tokens.is_empty() {
        return 0.0;
    }

    let query_tokens = filter_stop_words(query_tokens);
    let candidate_tokens = filter_stop_words(candidate_tokens);

    let query_counts = token_counts(&query_tokens);
    let candidate_counts = token_counts(&candidate_tokens);

    let common_weight: usize = query_counts
        .iter()
        .map(|(token, count)| (*count).min(candidate_counts.get(token).copied().unwrap_or(0)))
        .sum();
    let coverage = common_weight as f64 / query_tokens.len() as f64;

    let unique_query: HashSet<&str> = query_counts.keys().copied().collect();
    let unique_candidate: HashSet<&str> = candidate_counts.keys().copied().collect();
    let union = unique_query.union(&unique_candidate).count();
    let jaccard = if union == 0 {
        0.0
    } else {
        unique_query.intersection(&unique_candidate).count() as f64 / union as f64
    };

    let seq = sequence_ratio(&candidate_tokens.join(" "), &query_tokens.join(" "));

    let length_sum = candidate_tokens.len() + query_tokens.len();
    let length_penalty = if length_sum == 0 {
        0.0
    } else {
        let diff = candidate_tokens.len().abs_diff(query_tokens.len());
        (1.0 - diff as f64 / length_sum as f64).max(0.0)
    };

    0.55 * coverage + 0.25 * jaccard + 0.15 * seq + 0.05 * length_penalty
}

/// The SQL-side language filter for a prepared priority list: the
/// priority languages plus `"auto"`, or no filter at all.
pub(crate) fn language_pool_for(prepared: &[String]) -> Vec<String> {
    if prepared.is_empty() {
        Vec::new()
    } else {
        let mut pool = prepared.to_vec();
        pool.push("auto".to_string());
        pool
    }
}

/// Rank a persona's recent quotes against a text query.
///
/// The candidate pool is the `max(limit*6, sample_size)` most recent
/// quotes, restricted to the priority languages (plus `auto`) when a
/// priority is given. An empty or untokenizable query returns the most
/// recent `limit` candidates unranked. When at least one candidate
/// scores above zero only positive-scoring candidates are returned;
/// otherwise the top `limit` regardless of score, so a non-empty corpus
/// never yields an empty result.
pub async fn search_by_relevance(
    db: &Database,
    persona_id: i64,
    query: &str,
    language_priority: &[String],
    limit: usize,
    sample_size: usize,
) -> Result<Vec<Quote>, CytaraError> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let normalized_query = query.trim();
    let prepared = prepare_language_priority(language_priority);
    let pool_languages = language_pool_for(&prepared);
    let fetch_limit = (limit * 6).max(sample_size) as i64;
    let candidates =
        queries::quotes::recent_quotes(db, persona_id, &pool_languages, fetch_limit).await?;

    if normalized_query.is_empty() {
        debug!(persona_id, limit, "empty query, returning most recent quotes");
        return Ok(candidates.into_iter().take(limit).collect());
    }
    let query_tokens = tokenize(normalized_query);
    if query_tokens.is_empty() {
        debug!(persona_id, limit, "query did not tokenize, returning most recent quotes");
        return Ok(candidates.into_iter().take(limit).collect());
    }

    let mut ranked: Vec<(f64, Quote)> = Vec::new();
    for quote in &candidates {
        let content = quote.text_content.as_deref().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let candidate_tokens = tokenize(content);
        if candidate_tokens.is_empty() {
            continue;
        }
        let mut score = score_tokens(&query_tokens, &candidate_tokens);
        if !prepared.is_empty() && quote.language != "auto" && !prepared.contains(&quote.language)
        {
            score *= 0.85;
        }
        ranked.push((score, quote.clone()));
    }
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    if ranked.is_empty() {
        debug!(persona_id, "no scorable candidates, returning most recent quotes");
        return Ok(candidates.into_iter().take(limit).collect());
    }

    let positive: Vec<Quote> = ranked
        .iter()
        .filter(|(score, _)| *score > 0.0)
        .map(|(_, quote)| quote.clone())
        .take(limit)
        .collect();
    if !positive.is_empty() {
        info!(
            persona_id,
            hits = positive.len(),
            query = normalized_query,
            "relevance search matched"
        );
        return Ok(positive);
    }
    debug!(persona_id, "nothing scored above zero, returning top candidates");
    Ok(ranked.into_iter().take(limit).map(|(_, q)| q).collect())
}

async fn random_with_fallback(
    db: &Database,
    persona_id: i64,
    language_priority: &[String],
) -> Result<Option<Quote>, CytaraError> {
    let prepared = prepare_language_priority(language_priority);
    if !prepared.is_empty() {
        let pool = language_pool_for(&prepared);
        if let Some(quote) = queries::quotes::random_quote(db, persona_id, &pool).await? {
            return Ok(Some(quote));
        }
    }
    queries::quotes::random_quote(db, persona_id, &[]).await
}

/// Pick one quote for a query.
///
/// An empty query draws at random, preferring the priority languages and
/// falling back to an unconstrained draw. A non-empty query takes the top
/// search hit, with the same random fallback chain when the search comes
/// up empty. Whenever the persona has at least one quote this returns
/// `Some`.
pub async fn select_relevant_quote(
    db: &Database,
    persona_id: i64,
    query: &str,
    language_priority: &[String],
    limit: usize,
    sample_size: usize,
) -> Result<Option<Quote>, CytaraError> {
    let normalized_query = query.trim();
    if normalized_query.is_empty() {
        return random_with_fallback(db, persona_id, language_priority).await;
    }

    let hits = search_by_relevance(
        db,
        persona_id,
        normalized_query,
        language_priority,
        limit,
        sample_size,
    )
    .await?;
    if let Some(best) = hits.into_iter().next() {
        info!(persona_id, quote_id = best.id, "selected top search hit");
        return Ok(Some(best));
    }
    random_with_fallback(db, persona_id, language_priority).await
}

#[cfg(test)]
mod tests {
    use cytara_core::types::MediaType;
    use cytara_storage::models::NewQuote;
    use cytara_storage::queries::personas::create_persona;
    use cytara_storage::queries::quotes::insert_quote;
    use tempfile::tempdir;

    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn tokenizer_handles_diacritics_and_apostrophes() {
        assert_eq!(
            tokenize("Życie jest piękne, don't stop!"),
            toks(&["życie", "jest", "piękne", "don't", "stop"])
        );
        assert!(tokenize("!!! ...").is_empty());
    }

    #[test]
    fn stop_word_filter_never_empties_a_list() {
        let only_stop = toks(&["the", "and", "do"]);
        assert_eq!(filter_stop_words(&only_stop), only_stop);

        let mixed = toks(&["the", "answer"]);
        assert_eq!(filter_stop_words(&mixed), toks(&["answer"]));
    }

    #[test]
    fn identical_token_lists_score_one() {
        let tokens = toks(&["coffee", "before", "code"]);
        let score = score_tokens(&tokens, &tokens);
        assert!((score - 1.0).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn disjoint_token_lists_score_near_zero() {
        let score = score_tokens(&toks(&["alpha", "beta"]), &toks(&["gamma", "delta"]));
        assert!(score < 0.2, "score was {score}");
        assert!(score > 0.0);
    }

    #[test]
    fn partial_overlap_scores_between() {
        let query = toks(&["world", "peace"]);
        let full = score_tokens(&query, &query);
        let half = score_tokens(&query, &toks(&["world", "war"]));
        let none = score_tokens(&query, &toks(&["cabbage", "soup"]));
        assert!(full > half && half > none);
    }

    #[test]
    fn sequence_ratio_matches_known_values() {
        assert!((sequence_ratio("abc", "abc") - 1.0).abs() < 1e-9);
        assert!((sequence_ratio("", "") - 1.0).abs() < 1e-9);
        assert_eq!(sequence_ratio("abc", "xyz"), 0.0);
        // "abcd" vs "bcde": block "bcd" of length 3, ratio 2*3/8
        assert!((sequence_ratio("abcd", "bcde") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn language_priority_is_normalized_and_deduped() {
        let prepared = prepare_language_priority(&toks(&["PL", "pl-PL", "en-US", "", "en"]));
        assert_eq!(prepared, toks(&["pl", "en"]));
        assert!(prepare_language_priority(&[]).is_empty());
    }

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize_quote_text("  Hello\t\n  WORLD  "), "hello world");
        assert_eq!(normalize_quote_text(""), "");
    }

    async fn persona_with_quotes(texts: &[(&str, &str)]) -> (Database, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();
        let persona = create_persona(&db, "Ada", None, None).await.unwrap();
        for (text, language) in texts {
            insert_quote(
                &db,
                &NewQuote {
                    persona_id: persona.id,
                    media_type: MediaType::Text,
                    text_content: Some(text.to_string()),
                    file_id: None,
                    file_hash: None,
                    language: language.to_string(),
                    source_submission_id: None,
                },
            )
            .await
            .unwrap();
        }
        (db, persona.id, dir)
    }

    #[tokio::test]
    async fn search_ranks_exact_match_first() {
        let (db, persona_id, _dir) = persona_with_quotes(&[
            ("the compiler is my co-author", "en"),
            ("coffee before code", "en"),
            ("sleep is a suggestion", "en"),
        ])
        .await;

        let hits = search_by_relevance(&db, persona_id, "coffee before code", &[], 5, 50)
            .await
            .unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].text_content.as_deref(), Some("coffee before code"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn empty_query_returns_recent_quotes() {
        let (db, persona_id, _dir) =
            persona_with_quotes(&[("first", "en"), ("second", "en"), ("third", "en")]).await;

        let hits = search_by_relevance(&db, persona_id, "   ", &[], 2, 50)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text_content.as_deref(), Some("third"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn select_never_comes_up_empty_for_nonempty_corpus() {
        let (db, persona_id, _dir) = persona_with_quotes(&[("only one quote", "pl")]).await;

        let for_gibberish =
            select_relevant_quote(&db, persona_id, "zzzz qqqq", &[], 5, 50)
                .await
                .unwrap();
        assert!(for_gibberish.is_some());

        let for_empty = select_relevant_quote(&db, persona_id, "", &[], 5, 50)
            .await
            .unwrap();
        assert!(for_empty.is_some());

        // priority misses the corpus language, unconstrained fallback kicks in
        let for_wrong_lang =
            select_relevant_quote(&db, persona_id, "", &["de".to_string()], 5, 50)
                .await
                .unwrap();
        assert!(for_wrong_lang.is_some());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn empty_persona_selects_nothing() {
        let (db, persona_id, _dir) = persona_with_quotes(&[]).await;
        let selected = select_relevant_quote(&db, persona_id, "anything", &[], 5, 50)
            .await
            .unwrap();
        assert!(selected.is_none());
        db.close().await.unwrap();
    }
}
