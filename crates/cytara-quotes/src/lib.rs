// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quote corpus services: lexical relevance ranking, exact-duplicate
//! detection, and quote materialization from approved submissions.

pub mod duplicates;
pub mod ranking;
pub mod service;

pub use duplicates::find_exact_duplicate;
pub use ranking::{
    normalize_quote_text, prepare_language_priority, score_tokens, search_by_relevance,
    select_relevant_quote, sequence_ratio, tokenize,
};
pub use service::{
    count_quotes, create_quote_from_submission, delete_quote, quote_stats, random_quote,
};
