// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona identity rows.
//!
//! Removal is a soft delete. A removed row keeps its identifiers so a
//! later re-add of the same person can reactivate it via
//! [`refresh_identity`] instead of inserting a duplicate.

use cytara_core::CytaraError;
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::models::{NewIdentity, PersonaIdentity};

const IDENTITY_COLUMNS: &str = "id, persona_id, user_id, username, display_name, \
     added_by_user_id, added_in_chat_id, added_at, \
     removed_at, removed_by_user_id, removed_in_chat_id";

fn row_to_identity(row: &rusqlite::Row<'_>) -> rusqlite::Result<PersonaIdentity> {
    Ok(PersonaIdentity {
        id: row.get(0)?,
        persona_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        display_name: row.get(4)?,
        added_by_user_id: row.get(5)?,
        added_in_chat_id: row.get(6)?,
        added_at: row.get(7)?,
        removed_at: row.get(8)?,
        removed_by_user_id: row.get(9)?,
        removed_in_chat_id: row.get(10)?,
    })
}

/// Insert a new identity row and return it.
pub async fn insert_identity(
    db: &Database,
    identity: &NewIdentity,
) -> Result<PersonaIdentity, CytaraError> {
    let identity = identity.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO persona_identities
                     (persona_id, user_id, username, display_name,
                      added_by_user_id, added_in_chat_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    identity.persona_id,
                    identity.user_id,
                    identity.username,
                    identity.display_name,
                    identity.added_by_user_id,
                    identity.added_in_chat_id,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                &format!("SELECT {IDENTITY_COLUMNS} FROM persona_identities WHERE id = ?1"),
                params![id],
                row_to_identity,
            )?;
            Ok(row)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a single identity by id.
pub async fn get_identity(db: &Database, id: i64) -> Result<Option<PersonaIdentity>, CytaraError> {
    db.connection()
        .call(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {IDENTITY_COLUMNS} FROM persona_identities WHERE id = ?1"),
                    params![id],
                    row_to_identity,
                )
                .optional()?;
            Ok(row)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List the identities of a persona, active rows first.
pub async fn list_identities(
    db: &Database,
    persona_id: i64,
    include_removed: bool,
) -> Result<Vec<PersonaIdentity>, CytaraError> {
    db.connection()
        .call(move |conn| {
            let sql = if include_removed {
                format!(
                    "SELECT {IDENTITY_COLUMNS} FROM persona_identities
                     WHERE persona_id = ?1
                     ORDER BY CASE WHEN removed_at IS NULL THEN 0 ELSE 1 END, id ASC"
                )
            } else {
                format!(
                    "SELECT {IDENTITY_COLUMNS} FROM persona_identities
                     WHERE persona_id = ?1 AND removed_at IS NULL
                     ORDER BY id ASC"
                )
            };
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![persona_id], row_to_identity)?;
            let mut identities = Vec::new();
            for row in rows {
                identities.push(row?);
            }
            Ok(identities)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count the active identities of a persona.
pub async fn count_active_identities(db: &Database, persona_id: i64) -> Result<i64, CytaraError> {
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM persona_identities
                 WHERE persona_id = ?1 AND removed_at IS NULL",
                params![persona_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Merge identifier fields into a row. An incoming non-null value
/// replaces the stored one (a renamed handle propagates); a null leaves
/// the stored value alone.
pub async fn merge_identity_fields(
    db: &Database,
    id: i64,
    user_id: Option<i64>,
    username: Option<String>,
    display_name: Option<String>,
) -> Result<bool, CytaraError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE persona_identities
                 SET user_id = COALESCE(?1, user_id),
                     username = COALESCE(?2, username),
                     display_name = COALESCE(?3, display_name)
                 WHERE id = ?4",
                params![user_id, username, display_name, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Reactivate a previously removed identity: clear the removal metadata
/// and stamp fresh add provenance. Returns the refreshed row, or `None`
/// when the id does not exist.
pub async fn refresh_identity(
    db: &Database,
    id: i64,
    added_by_user_id: Option<i64>,
    added_in_chat_id: Option<i64>,
) -> Result<Option<PersonaIdentity>, CytaraError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE persona_identities
                 SET removed_at = NULL,
                     removed_by_user_id = NULL,
                     removed_in_chat_id = NULL,
                     added_by_user_id = ?1,
                     added_in_chat_id = ?2,
                     added_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![added_by_user_id, added_in_chat_id, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let row = conn.query_row(
                &format!("SELECT {IDENTITY_COLUMNS} FROM persona_identities WHERE id = ?1"),
                params![id],
                row_to_identity,
            )?;
            Ok(Some(row))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Soft-delete an identity. Returns false when the row is missing or
/// already removed, so repeated removals are harmless.
pub async fn mark_identity_removed(
    db: &Database,
    id: i64,
    removed_by_user_id: Option<i64>,
    removed_in_chat_id: Option<i64>,
) -> Result<bool, CytaraError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE persona_identities
                 SET removed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                     removed_by_user_id = ?1,
                     removed_in_chat_id = ?2
                 WHERE id = ?3 AND removed_at IS NULL",
                params![removed_by_user_id, removed_in_chat_id, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
