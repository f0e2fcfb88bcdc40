// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure identity matching.
//!
//! A submission carries author metadata; a persona carries registered
//! identity records. [`evaluate`] decides whether the submission's author
//! is one of the registered identities. Matching is AND over the fields a
//! record populates: a record with both an id and a username only matches
//! a candidate agreeing on both.

use cytara_core::types::{PersonaIdentity, Submission};
use serde::Serialize;
use strum::Display;

/// Which identity field agreed between record and candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Id,
    Alias,
    Name,
}

/// The author metadata a submission is matched on, already normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Candidate {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub display_name: Option<String>,
}

/// A record that agreed on some fields but was disqualified on others.
#[derive(Debug, Clone, Serialize)]
pub struct PartialMatch {
    pub identity: PersonaIdentity,
    pub fields: Vec<MatchField>,
}

/// Outcome of [`evaluate`].
///
/// `descriptors` holds every active record considered, so a caller can
/// tell "no identities registered" (`descriptors.is_empty()`) apart from
/// "identities registered, none matched".
#[derive(Debug, Clone, Serialize)]
pub struct IdentityMatchResult {
    pub matched: bool,
    pub matched_identity: Option<PersonaIdentity>,
    pub matched_fields: Vec<MatchField>,
    pub candidate: Candidate,
    pub descriptors: Vec<PersonaIdentity>,
    pub partial_matches: Vec<PartialMatch>,
}

/// Lowercase a username with surrounding whitespace and a leading `@`
/// stripped.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_lowercase()
}

/// Collapse internal whitespace runs to single spaces and case-fold.
pub fn normalize_display_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Decide whose metadata the matcher compares against.
///
/// A quoted-author field set on the submission means the quote was
/// forwarded; the original author, not the submitter, must be verified.
pub fn resolve_candidate(submission: &Submission) -> Candidate {
    let quoted_present = submission.quoted_user_id.is_some()
        || submission.quoted_username.is_some()
        || submission.quoted_name.is_some();
    let (user_id, username, display_name) = if quoted_present {
        (
            submission.quoted_user_id,
            submission.quoted_username.as_deref(),
            submission.quoted_name.as_deref(),
        )
    } else {
        (
            Some(submission.submitted_by_user_id),
            submission.submitted_by_username.as_deref(),
            submission.submitted_by_name.as_deref(),
        )
    };
    Candidate {
        user_id,
        username: username.map(normalize_username).filter(|s| !s.is_empty()),
        display_name: display_name
            .map(normalize_display_name)
            .filter(|s| !s.is_empty()),
    }
}

/// Try a full AND match of one record against the candidate. `None` means
/// disqualified; a record with no populated fields never qualifies.
fn match_descriptor(candidate: &Candidate, identity: &PersonaIdentity) -> Option<Vec<MatchField>> {
    let fields = agreeing_fields(candidate, identity);
    let required = populated_field_count(identity);
    if required > 0 && fields.len() == required {
        Some(fields)
    } else {
        None
    }
}

fn populated_field_count(identity: &PersonaIdentity) -> usize {
    [
        identity.user_id.is_some(),
        identity.username.is_some(),
        identity.display_name.is_some(),
    ]
    .iter()
    .filter(|p| **p)
    .count()
}

/// Fields present on the record that the candidate agrees with.
fn agreeing_fields(candidate: &Candidate, identity: &PersonaIdentity) -> Vec<MatchField> {
    let mut fields = Vec::new();
    if let (Some(want), Some(have)) = (identity.user_id, candidate.user_id) {
        if want == have {
            fields.push(MatchField::Id);
        }
    }
    if let (Some(want), Some(have)) = (identity.username.as_deref(), candidate.username.as_deref())
    {
        if normalize_username(want) == have {
            fields.push(MatchField::Alias);
        }
    }
    if let (Some(want), Some(have)) = (
        identity.display_name.as_deref(),
        candidate.display_name.as_deref(),
    ) {
        if normalize_display_name(want) == have {
            fields.push(MatchField::Name);
        }
    }
    fields
}

/// Match a submission's author against a persona's identity records.
///
/// Removed records are ignored. The first fully matching record wins.
/// When nothing fully matches, every record's agreeing fields are
/// collected as partial matches for reviewer display.
pub fn evaluate(submission: &Submission, identities: &[PersonaIdentity]) -> IdentityMatchResult {
    let candidate = resolve_candidate(submission);
    let descriptors: Vec<PersonaIdentity> = identities
        .iter()
        .filter(|identity| identity.is_active())
        .cloned()
        .collect();

    for identity in &descriptors {
        if let Some(fields) = match_descriptor(&candidate, identity) {
            return IdentityMatchResult {
                matched: true,
                matched_identity: Some(identity.clone()),
                matched_fields: fields,
                candidate,
                descriptors,
                partial_matches: Vec::new(),
            };
        }
    }

    let partial_matches: Vec<PartialMatch> = descriptors
        .iter()
        .filter_map(|identity| {
            let fields = agreeing_fields(&candidate, identity);
            if fields.is_empty() {
                None
            } else {
                Some(PartialMatch {
                    identity: identity.clone(),
                    fields,
                })
            }
        })
        .collect();

    IdentityMatchResult {
        matched: false,
        matched_identity: None,
        matched_fields: Vec::new(),
        candidate,
        descriptors,
        partial_matches,
    }
}

/// Render one record for human display, e.g. `ID 111, @ada, Ada Lovelace`.
/// A record with no identifiers falls back to its row number.
pub fn describe_identity(identity: &PersonaIdentity) -> String {
    let mut parts = Vec::new();
    if let Some(user_id) = identity.user_id {
        parts.push(format!("ID {user_id}"));
    }
    if let Some(username) = &identity.username {
        parts.push(format!("@{}", username.trim_start_matches('@')));
    }
    if let Some(display_name) = &identity.display_name {
        parts.push(display_name.clone());
    }
    if parts.is_empty() {
        format!("record #{}", identity.id)
    } else {
        parts.join(", ")
    }
}
