// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity lifecycle over storage.
//!
//! Adding an identity is a soft-upsert: an equivalent existing record
//! (same user id, or same normalized username, or same normalized
//! display name) takes the incoming fields, so a renamed handle replaces
//! the stored one, and is reactivated if it had been removed. Removal is
//! always a soft delete.

use cytara_core::CytaraError;
use cytara_storage::models::{NewIdentity, PersonaIdentity};
use cytara_storage::{Database, queries};
use tracing::{debug, info};

use crate::matcher::{normalize_display_name, normalize_username};

/// How [`add_identity`] resolved the request.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// A fresh record was inserted.
    Created(PersonaIdentity),
    /// An equivalent record existed; fields were merged and the record
    /// reactivated if necessary.
    Merged(PersonaIdentity),
}

impl AddOutcome {
    pub fn identity(&self) -> &PersonaIdentity {
        match self {
            AddOutcome::Created(identity) | AddOutcome::Merged(identity) => identity,
        }
    }
}

// Stored as given (minus the @ and padding) so reviewer-facing output
// keeps the user's casing; comparisons case-fold in the matcher.
fn sanitize_username(raw: Option<&str>) -> Option<String> {
    raw.map(|s| s.trim().trim_start_matches('@').to_string())
        .filter(|s| !s.is_empty())
}

fn sanitize_display_name(raw: Option<&str>) -> Option<String> {
    raw.map(|s| {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    })
    .filter(|s| !s.is_empty())
}

fn find_equivalent<'a>(
    identities: &'a [PersonaIdentity],
    user_id: Option<i64>,
    username: &Option<String>,
    display_name: &Option<String>,
) -> Option<&'a PersonaIdentity> {
    if let Some(uid) = user_id {
        if let Some(hit) = identities.iter().find(|i| i.user_id == Some(uid)) {
            return Some(hit);
        }
    }
    if let Some(uname) = username {
        let target = normalize_username(uname);
        if let Some(hit) = identities
            .iter()
            .find(|i| i.username.as_deref().map(normalize_username) == Some(target.clone()))
        {
            return Some(hit);
        }
    }
    if let Some(dname) = display_name {
        let target = normalize_display_name(dname);
        if let Some(hit) = identities.iter().find(|i| {
            i.display_name.as_deref().map(normalize_display_name) == Some(target.clone())
        }) {
            return Some(hit);
        }
    }
    None
}

/// Register an identity for a persona, merging into an equivalent
/// existing record when one is found.
pub async fn add_identity(
    db: &Database,
    persona_id: i64,
    user_id: Option<i64>,
    username: Option<&str>,
    display_name: Option<&str>,
    added_by_user_id: Option<i64>,
    added_in_chat_id: Option<i64>,
) -> Result<AddOutcome, CytaraError> {
    let username = sanitize_username(username);
    let display_name = sanitize_display_name(display_name);
    if user_id.is_none() && username.is_none() && display_name.is_none() {
        return Err(CytaraError::Validation(
            "identity needs at least one of user id, username, or display name".to_string(),
        ));
    }

    let existing = queries::identities::list_identities(db, persona_id, true).await?;
    if let Some(hit) = find_equivalent(&existing, user_id, &username, &display_name) {
        let id = hit.id;
        debug!(identity_id = id, persona_id, "merging into existing identity");
        queries::identities::merge_identity_fields(
            db,
            id,
            user_id,
            username.clone(),
            display_name.clone(),
        )
        .await?;
        let refreshed =
            queries::identities::refresh_identity(db, id, added_by_user_id, added_in_chat_id)
                .await?
                .ok_or_else(|| {
                    CytaraError::Internal(format!("identity {id} vanished during merge"))
                })?;
        info!(identity_id = id, persona_id, "identity merged");
        return Ok(AddOutcome::Merged(refreshed));
    }

    let created = queries::identities::insert_identity(
        db,
        &NewIdentity {
            persona_id,
            user_id,
            username,
            display_name,
            added_by_user_id,
            added_in_chat_id,
        },
    )
    .await?;
    info!(identity_id = created.id, persona_id, "identity created");
    Ok(AddOutcome::Created(created))
}

/// Soft-delete an identity. Returns false when it was already removed or
/// never existed.
pub async fn remove_identity(
    db: &Database,
    identity_id: i64,
    removed_by_user_id: Option<i64>,
    removed_in_chat_id: Option<i64>,
) -> Result<bool, CytaraError> {
    let removed = queries::identities::mark_identity_removed(
        db,
        identity_id,
        removed_by_user_id,
        removed_in_chat_id,
    )
    .await?;
    if removed {
        info!(identity_id, "identity removed");
    }
    Ok(removed)
}

/// List a persona's identities, active rows first.
pub async fn list_identities(
    db: &Database,
    persona_id: i64,
    include_removed: bool,
) -> Result<Vec<PersonaIdentity>, CytaraError> {
    queries::identities::list_identities(db, persona_id, include_removed).await
}
