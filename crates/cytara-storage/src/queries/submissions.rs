// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Submission rows and the moderation decision transition.
//!
//! Decisions use an optimistic guard: the UPDATE is conditioned on
//! `status = 'pending'` and the audit row lands in the same transaction,
//! so two moderators racing on one submission produce exactly one
//! decision and one audit record.

use cytara_core::CytaraError;
use cytara_core::types::ModerationStatus;
use rusqlite::{OptionalExtension, params, params_from_iter};

use crate::database::Database;
use crate::models::{ModerationAction, NewSubmission, Submission};
use crate::queries::parse_enum_column;

const SUBMISSION_COLUMNS: &str = "id, persona_id, submitted_by_user_id, submitted_chat_id, \
     submitted_by_username, submitted_by_name, \
     quoted_user_id, quoted_username, quoted_name, \
     media_type, text_content, file_id, file_hash, \
     status, created_at, decided_at, decided_by_user_id, decided_in_chat_id, rejection_reason";

pub(crate) fn row_to_submission(row: &rusqlite::Row<'_>) -> rusqlite::Result<Submission> {
    let media_type: String = row.get(9)?;
    let status: String = row.get(13)?;
    Ok(Submission {
        id: row.get(0)?,
        persona_id: row.get(1)?,
        submitted_by_user_id: row.get(2)?,
        submitted_chat_id: row.get(3)?,
        submitted_by_username: row.get(4)?,
        submitted_by_name: row.get(5)?,
        quoted_user_id: row.get(6)?,
        quoted_username: row.get(7)?,
        quoted_name: row.get(8)?,
        media_type: parse_enum_column(media_type, 9)?,
        text_content: row.get(10)?,
        file_id: row.get(11)?,
        file_hash: row.get(12)?,
        status: parse_enum_column(status, 13)?,
        created_at: row.get(14)?,
        decided_at: row.get(15)?,
        decided_by_user_id: row.get(16)?,
        decided_in_chat_id: row.get(17)?,
        rejection_reason: row.get(18)?,
    })
}

fn row_to_action(row: &rusqlite::Row<'_>) -> rusqlite::Result<ModerationAction> {
    let action: String = row.get(4)?;
    Ok(ModerationAction {
        id: row.get(0)?,
        submission_id: row.get(1)?,
        performed_by_user_id: row.get(2)?,
        admin_chat_id: row.get(3)?,
        action: parse_enum_column(action, 4)?,
        created_at: row.get(5)?,
        notes: row.get(6)?,
    })
}

/// Outcome of [`decide_submission`].
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionApplied {
    /// The guard matched; the submission now carries the decision.
    Decided(Submission),
    /// Another moderator got there first. Carries the status they set.
    NotPending(ModerationStatus),
    NotFound,
}

/// Insert a new pending submission and return the stored row.
pub async fn insert_submission(
    db: &Database,
    submission: &NewSubmission,
) -> Result<Submission, CytaraError> {
    let s = submission.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO submissions
                     (persona_id, submitted_by_user_id, submitted_chat_id,
                      submitted_by_username, submitted_by_name,
                      quoted_user_id, quoted_username, quoted_name,
                      media_type, text_content, file_id, file_hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    s.persona_id,
                    s.submitted_by_user_id,
                    s.submitted_chat_id,
                    s.submitted_by_username,
                    s.submitted_by_name,
                    s.quoted_user_id,
                    s.quoted_username,
                    s.quoted_name,
                    s.media_type.to_string(),
                    s.text_content,
                    s.file_id,
                    s.file_hash,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1"),
                params![id],
                row_to_submission,
            )?;
            Ok(row)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a submission by id.
pub async fn get_submission(db: &Database, id: i64) -> Result<Option<Submission>, CytaraError> {
    db.connection()
        .call(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1"),
                    params![id],
                    row_to_submission,
                )
                .optional()?;
            Ok(row)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List pending submissions oldest first, optionally scoped to one persona
/// and skipping ids a caller is already holding.
pub async fn list_pending(
    db: &Database,
    persona_id: Option<i64>,
    limit: Option<i64>,
    exclude_ids: &[i64],
) -> Result<Vec<Submission>, CytaraError> {
    let exclude_ids = exclude_ids.to_vec();
    db.connection()
        .call(move |conn| {
            let mut sql =
                format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE status = 'pending'");
            let mut args: Vec<i64> = Vec::new();
            if let Some(pid) = persona_id {
                sql.push_str(" AND persona_id = ?");
                args.push(pid);
            }
            if !exclude_ids.is_empty() {
                sql.push_str(" AND id NOT IN (");
                sql.push_str(&vec!["?"; exclude_ids.len()].join(", "));
                sql.push(')');
                args.extend_from_slice(&exclude_ids);
            }
            sql.push_str(" ORDER BY created_at ASC, id ASC");
            if let Some(lim) = limit {
                sql.push_str(" LIMIT ?");
                args.push(lim);
            }
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args), row_to_submission)?;
            let mut submissions = Vec::new();
            for row in rows {
                submissions.push(row?);
            }
            Ok(submissions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count pending submissions, optionally scoped to one persona.
pub async fn count_pending(db: &Database, persona_id: Option<i64>) -> Result<i64, CytaraError> {
    db.connection()
        .call(move |conn| {
            let count = match persona_id {
                Some(pid) => conn.query_row(
                    "SELECT COUNT(*) FROM submissions WHERE status = 'pending' AND persona_id = ?1",
                    params![pid],
                    |row| row.get(0),
                )?,
                None => conn.query_row(
                    "SELECT COUNT(*) FROM submissions WHERE status = 'pending'",
                    [],
                    |row| row.get(0),
                )?,
            };
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete pending submissions outright. Returns the number of rows removed.
pub async fn purge_pending(db: &Database, persona_id: Option<i64>) -> Result<usize, CytaraError> {
    db.connection()
        .call(move |conn| {
            let removed = match persona_id {
                Some(pid) => conn.execute(
                    "DELETE FROM submissions WHERE status = 'pending' AND persona_id = ?1",
                    params![pid],
                )?,
                None => conn.execute("DELETE FROM submissions WHERE status = 'pending'", [])?,
            };
            Ok(removed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a moderation decision. The status transition and the audit row
/// commit atomically; when the submission is no longer pending nothing is
/// written and the stored status is reported back.
pub async fn decide_submission(
    db: &Database,
    id: i64,
    action: ModerationStatus,
    decided_by_user_id: Option<i64>,
    decided_in_chat_id: Option<i64>,
    rejection_reason: Option<String>,
    notes: Option<String>,
) -> Result<DecisionApplied, CytaraError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE submissions
                 SET status = ?1,
                     decided_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                     decided_by_user_id = ?2,
                     decided_in_chat_id = ?3,
                     rejection_reason = ?4
                 WHERE id = ?5 AND status = 'pending'",
                params![
                    action.to_string(),
                    decided_by_user_id,
                    decided_in_chat_id,
                    rejection_reason,
                    id
                ],
            )?;
            if changed == 0 {
                let status: Option<String> = tx
                    .query_row(
                        "SELECT status FROM submissions WHERE id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?;
                tx.rollback()?;
                return Ok(match status {
                    Some(s) => DecisionApplied::NotPending(parse_enum_column(s, 0)?),
                    None => DecisionApplied::NotFound,
                });
            }
            tx.execute(
                "INSERT INTO moderation_actions
                     (submission_id, performed_by_user_id, admin_chat_id, action, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, decided_by_user_id, decided_in_chat_id, action.to_string(), notes],
            )?;
            let submission = tx.query_row(
                &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1"),
                params![id],
                row_to_submission,
            )?;
            tx.commit()?;
            Ok(DecisionApplied::Decided(submission))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Audit trail for one submission, oldest first.
pub async fn list_actions(
    db: &Database,
    submission_id: i64,
) -> Result<Vec<ModerationAction>, CytaraError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, submission_id, performed_by_user_id, admin_chat_id,
                        action, created_at, notes
                 FROM moderation_actions WHERE submission_id = ?1
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![submission_id], row_to_action)?;
            let mut actions = Vec::new();
            for row in rows {
                actions.push(row?);
            }
            Ok(actions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
