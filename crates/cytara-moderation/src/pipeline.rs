// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The moderation state machine.
//!
//! Submissions enter as `pending` and leave exactly once, to `approved`
//! or `rejected`. Approval carries two gates the storage layer does not
//! know about: the author must match a registered identity, and a payload
//! already present in the corpus is reported instead of duplicated. The
//! underlying status transition is optimistic; losing a race surfaces as
//! [`CytaraError::AlreadyDecided`] and mutates nothing further.

use cytara_core::CytaraError;
use cytara_core::types::{DuplicateReason, MediaType, ModerationStatus};
use cytara_identity::matcher;
use cytara_storage::models::{NewSubmission, Quote, Submission};
use cytara_storage::queries::submissions::DecisionApplied;
use cytara_storage::{Database, queries};
use tracing::{debug, info, warn};

/// What an approval produced.
#[derive(Debug, Clone)]
pub enum ApprovalOutcome {
    /// A new quote entered the corpus.
    Approved { submission: Submission, quote: Quote },
    /// The submission was approved but its payload already exists; no new
    /// quote was created. Carries the existing quote and the rule that
    /// recognized it.
    Duplicate {
        submission: Submission,
        existing: Quote,
        reason: DuplicateReason,
    },
}

fn validate_payload(submission: &NewSubmission) -> Result<(), CytaraError> {
    match submission.media_type {
        MediaType::Text => {
            let has_text = submission
                .text_content
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty());
            if !has_text {
                return Err(CytaraError::Validation(
                    "text submission requires text content".to_string(),
                ));
            }
        }
        MediaType::Image | MediaType::Audio => {
            let has_file = submission
                .file_id
                .as_deref()
                .is_some_and(|f| !f.trim().is_empty());
            if !has_file {
                return Err(CytaraError::Validation(format!(
                    "{} submission requires a file reference",
                    submission.media_type
                )));
            }
        }
    }
    Ok(())
}

/// Validate and persist a new pending submission.
pub async fn create_submission(
    db: &Database,
    submission: &NewSubmission,
) -> Result<Submission, CytaraError> {
    validate_payload(submission)?;
    let created = queries::submissions::insert_submission(db, submission).await?;
    info!(
        submission_id = created.id,
        persona_id = created.persona_id,
        media_type = %created.media_type,
        "submission created"
    );
    Ok(created)
}

/// Pending submissions oldest first. `exclude` is a caller-held skip set
/// (items currently shown to another reviewer); it is never persisted.
pub async fn pending_submissions(
    db: &Database,
    persona_id: Option<i64>,
    limit: Option<i64>,
    exclude: &[i64],
) -> Result<Vec<Submission>, CytaraError> {
    queries::submissions::list_pending(db, persona_id, limit, exclude).await
}

/// Queue depth, optionally per persona.
pub async fn count_pending(db: &Database, persona_id: Option<i64>) -> Result<i64, CytaraError> {
    let total = queries::submissions::count_pending(db, persona_id).await?;
    debug!(persona_id, total, "pending queue depth");
    Ok(total)
}

/// Hard-delete pending submissions. Destructive and not a state
/// transition; decided rows are never touched.
pub async fn purge_pending(db: &Database, persona_id: Option<i64>) -> Result<usize, CytaraError> {
    let removed = queries::submissions::purge_pending(db, persona_id).await?;
    warn!(persona_id, removed, "purged pending submissions");
    Ok(removed)
}

fn mismatch_message(result: &matcher::IdentityMatchResult) -> String {
    if result.descriptors.is_empty() {
        return "persona has no registered identities".to_string();
    }
    if let Some(partial) = result.partial_matches.first() {
        let fields: Vec<String> = partial.fields.iter().map(|f| f.to_string()).collect();
        return format!(
            "author does not fully match any registered identity; closest is {} agreeing on {}",
            matcher::describe_identity(&partial.identity),
            fields.join(", ")
        );
    }
    "author matches none of the registered identities".to_string()
}

/// Approve a pending submission.
///
/// Gates, in order: the submission must exist; its author must match one
/// of the persona's registered identities; the pending-state guard must
/// win. A payload the corpus already holds short-circuits quote creation
/// and reports the existing quote instead.
pub async fn approve(
    db: &Database,
    submission_id: i64,
    moderator_user_id: Option<i64>,
    moderator_chat_id: Option<i64>,
    override_language: Option<&str>,
    notes: Option<String>,
) -> Result<ApprovalOutcome, CytaraError> {
    let submission = queries::submissions::get_submission(db, submission_id)
        .await?
        .ok_or_else(|| CytaraError::NotFound(format!("submission {submission_id}")))?;

    let identities =
        queries::identities::list_identities(db, submission.persona_id, false).await?;
    let verdict = matcher::evaluate(&submission, &identities);
    if !verdict.matched {
        debug!(
            submission_id,
            persona_id = submission.persona_id,
            partials = verdict.partial_matches.len(),
            "identity precondition failed"
        );
        return Err(CytaraError::IdentityMismatch(mismatch_message(&verdict)));
    }

    let decided = match queries::submissions::decide_submission(
        db,
        submission_id,
        ModerationStatus::Approved,
        moderator_user_id,
        moderator_chat_id,
        None,
        notes,
    )
    .await?
    {
        DecisionApplied::Decided(submission) => submission,
        DecisionApplied::NotPending(status) => {
            return Err(CytaraError::AlreadyDecided { status });
        }
        DecisionApplied::NotFound => {
            return Err(CytaraError::NotFound(format!("submission {submission_id}")));
        }
    };

    if let Some((existing, reason)) = cytara_quotes::find_exact_duplicate(
        db,
        decided.persona_id,
        decided.media_type,
        decided.text_content.as_deref(),
        decided.file_id.as_deref(),
        decided.file_hash.as_deref(),
    )
    .await?
    {
        info!(
            submission_id,
            existing_quote_id = existing.id,
            reason = %reason,
            "approved submission duplicates an existing quote"
        );
        return Ok(ApprovalOutcome::Duplicate {
            submission: decided,
            existing,
            reason,
        });
    }

    let persona = queries::personas::get_persona_by_id(db, decided.persona_id)
        .await?
        .ok_or_else(|| {
            CytaraError::Internal(format!("persona {} missing for submission", decided.persona_id))
        })?;
    let quote = cytara_quotes::create_quote_from_submission(
        db,
        &decided,
        &persona.language,
        override_language,
    )
    .await?;
    info!(submission_id, quote_id = quote.id, "submission approved");
    Ok(ApprovalOutcome::Approved {
        submission: decided,
        quote,
    })
}

/// Reject a pending submission. No identity precondition; the optional
/// reason lands on the submission and in the audit row.
pub async fn reject(
    db: &Database,
    submission_id: i64,
    moderator_user_id: Option<i64>,
    moderator_chat_id: Option<i64>,
    reason: Option<String>,
) -> Result<Submission, CytaraError> {
    match queries::submissions::decide_submission(
        db,
        submission_id,
        ModerationStatus::Rejected,
        moderator_user_id,
        moderator_chat_id,
        reason.clone(),
        reason,
    )
    .await?
    {
        DecisionApplied::Decided(submission) => {
            info!(submission_id, "submission rejected");
            Ok(submission)
        }
        DecisionApplied::NotPending(status) => Err(CytaraError::AlreadyDecided { status }),
        DecisionApplied::NotFound => {
            Err(CytaraError::NotFound(format!("submission {submission_id}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use cytara_identity::service::add_identity;
    use cytara_storage::queries::personas::create_persona;
    use tempfile::tempdir;

    use super::*;

    async fn setup() -> (Database, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();
        let persona = create_persona(&db, "Ada", None, Some("pl")).await.unwrap();
        (db, persona.id, dir)
    }

    fn text_submission(persona_id: i64, text: &str) -> NewSubmission {
        NewSubmission {
            persona_id,
            submitted_by_user_id: 111,
            submitted_chat_id: -100,
            submitted_by_username: Some("ada".to_string()),
            submitted_by_name: None,
            quoted_user_id: None,
            quoted_username: None,
            quoted_name: None,
            media_type: MediaType::Text,
            text_content: Some(text.to_string()),
            file_id: None,
            file_hash: None,
        }
    }

    #[tokio::test]
    async fn intake_validates_payload_against_media_kind() {
        let (db, persona_id, _dir) = setup().await;

        let mut no_text = text_submission(persona_id, "x");
        no_text.text_content = Some("   ".to_string());
        let err = create_submission(&db, &no_text).await.unwrap_err();
        assert!(matches!(err, CytaraError::Validation(_)));

        let mut image = text_submission(persona_id, "ignored");
        image.media_type = MediaType::Image;
        image.text_content = None;
        image.file_id = None;
        let err = create_submission(&db, &image).await.unwrap_err();
        assert!(matches!(err, CytaraError::Validation(_)));

        image.file_id = Some("img-1".to_string());
        let created = create_submission(&db, &image).await.unwrap();
        assert_eq!(created.status, ModerationStatus::Pending);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn approval_without_identities_fails_and_mutates_nothing() {
        let (db, persona_id, _dir) = setup().await;

        let submission = create_submission(&db, &text_submission(persona_id, "hello"))
            .await
            .unwrap();
        let err = approve(&db, submission.id, Some(500), None, None, None)
            .await
            .unwrap_err();
        match err {
            CytaraError::IdentityMismatch(msg) => {
                assert!(msg.contains("no registered identities"), "msg: {msg}");
            }
            other => panic!("expected IdentityMismatch, got {other:?}"),
        }

        let unchanged = queries::submissions::get_submission(&db, submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.status, ModerationStatus::Pending);
        assert!(
            queries::submissions::list_actions(&db, submission.id)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            cytara_quotes::count_quotes(&db, persona_id).await.unwrap(),
            0
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mismatch_message_names_nearest_partial() {
        let (db, persona_id, _dir) = setup().await;
        add_identity(&db, persona_id, Some(111), Some("lovelace"), None, None, None)
            .await
            .unwrap();

        // same user id, wrong username: partial on id only
        let submission = create_submission(&db, &text_submission(persona_id, "hello"))
            .await
            .unwrap();
        let err = approve(&db, submission.id, None, None, None, None)
            .await
            .unwrap_err();
        match err {
            CytaraError::IdentityMismatch(msg) => {
                assert!(msg.contains("agreeing on id"), "msg: {msg}");
                assert!(msg.contains("@lovelace"), "msg: {msg}");
            }
            other => panic!("expected IdentityMismatch, got {other:?}"),
        }

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn approval_creates_quote_in_persona_language() {
        let (db, persona_id, _dir) = setup().await;
        add_identity(&db, persona_id, Some(111), None, None, None, None)
            .await
            .unwrap();

        let submission = create_submission(&db, &text_submission(persona_id, "hello world"))
            .await
            .unwrap();
        let outcome = approve(&db, submission.id, Some(500), Some(-200), None, None)
            .await
            .unwrap();
        let quote = match outcome {
            ApprovalOutcome::Approved { quote, .. } => quote,
            other => panic!("expected Approved, got {other:?}"),
        };
        assert_eq!(quote.language, "pl");
        assert_eq!(quote.source_submission_id, Some(submission.id));

        let actions = queries::submissions::list_actions(&db, submission.id)
            .await
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action, ModerationStatus::Approved);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_approval_reports_existing_quote() {
        let (db, persona_id, _dir) = setup().await;
        add_identity(&db, persona_id, Some(111), None, None, None, None)
            .await
            .unwrap();

        let first = create_submission(&db, &text_submission(persona_id, "same words"))
            .await
            .unwrap();
        let first_outcome = approve(&db, first.id, None, None, None, None).await.unwrap();
        let original_quote = match first_outcome {
            ApprovalOutcome::Approved { quote, .. } => quote,
            other => panic!("expected Approved, got {other:?}"),
        };

        let second = create_submission(&db, &text_submission(persona_id, "SAME   words"))
            .await
            .unwrap();
        let outcome = approve(&db, second.id, None, None, None, None).await.unwrap();
        match outcome {
            ApprovalOutcome::Duplicate {
                submission,
                existing,
                reason,
            } => {
                assert_eq!(existing.id, original_quote.id);
                assert_eq!(reason, DuplicateReason::Text);
                assert_eq!(submission.status, ModerationStatus::Approved);
            }
            other => panic!("expected Duplicate, got {other:?}"),
        }
        assert_eq!(
            cytara_quotes::count_quotes(&db, persona_id).await.unwrap(),
            1
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn second_decision_loses_the_race() {
        let (db, persona_id, _dir) = setup().await;
        add_identity(&db, persona_id, Some(111), None, None, None, None)
            .await
            .unwrap();

        let submission = create_submission(&db, &text_submission(persona_id, "hello"))
            .await
            .unwrap();
        reject(&db, submission.id, Some(1), None, Some("off topic".to_string()))
            .await
            .unwrap();

        let err = approve(&db, submission.id, Some(2), None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CytaraError::AlreadyDecided {
                status: ModerationStatus::Rejected
            }
        ));

        let err = reject(&db, 9999, None, None, None).await.unwrap_err();
        assert!(matches!(err, CytaraError::NotFound(_)));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn queue_scoping_and_purge() {
        let (db, persona_id, _dir) = setup().await;

        let a = create_submission(&db, &text_submission(persona_id, "one"))
            .await
            .unwrap();
        let b = create_submission(&db, &text_submission(persona_id, "two"))
            .await
            .unwrap();

        let skipping_a = pending_submissions(&db, Some(persona_id), None, &[a.id])
            .await
            .unwrap();
        assert_eq!(skipping_a.len(), 1);
        assert_eq!(skipping_a[0].id, b.id);

        assert_eq!(count_pending(&db, Some(persona_id)).await.unwrap(), 2);
        assert_eq!(purge_pending(&db, Some(persona_id)).await.unwrap(), 2);
        assert_eq!(count_pending(&db, Some(persona_id)).await.unwrap(), 0);

        db.close().await.unwrap();
    }
}
