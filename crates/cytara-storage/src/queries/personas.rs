// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona CRUD operations.
//!
//! Persona names are unique case-insensitively; `create_persona` is a
//! get-or-create so repeated registrations converge on one row.

use cytara_core::CytaraError;
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::models::Persona;

const PERSONA_COLUMNS: &str = "id, name, description, language, created_at, is_active";

fn row_to_persona(row: &rusqlite::Row<'_>) -> rusqlite::Result<Persona> {
    Ok(Persona {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        language: row.get(3)?,
        created_at: row.get(4)?,
        is_active: row.get(5)?,
    })
}

/// Get or create a persona by name (case-insensitive). When the persona
/// already exists the stored row wins; the passed description and language
/// are only used on first creation.
pub async fn create_persona(
    db: &Database,
    name: &str,
    description: Option<&str>,
    language: Option<&str>,
) -> Result<Persona, CytaraError> {
    let name = name.to_string();
    let description = description.map(str::to_string);
    let language = language.unwrap_or("auto").to_string();
    db.connection()
        .call(move |conn| {
            let existing = conn
                .query_row(
                    &format!("SELECT {PERSONA_COLUMNS} FROM personas WHERE name = ?1 COLLATE NOCASE"),
                    params![name],
                    row_to_persona,
                )
                .optional()?;
            if let Some(persona) = existing {
                return Ok(persona);
            }
            conn.execute(
                "INSERT INTO personas (name, description, language) VALUES (?1, ?2, ?3)",
                params![name, description, language],
            )?;
            let id = conn.last_insert_rowid();
            let persona = conn.query_row(
                &format!("SELECT {PERSONA_COLUMNS} FROM personas WHERE id = ?1"),
                params![id],
                row_to_persona,
            )?;
            Ok(persona)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a persona by id.
pub async fn get_persona_by_id(db: &Database, id: i64) -> Result<Option<Persona>, CytaraError> {
    db.connection()
        .call(move |conn| {
            let persona = conn
                .query_row(
                    &format!("SELECT {PERSONA_COLUMNS} FROM personas WHERE id = ?1"),
                    params![id],
                    row_to_persona,
                )
                .optional()?;
            Ok(persona)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a persona by name, case-insensitively.
pub async fn get_persona_by_name(
    db: &Database,
    name: &str,
) -> Result<Option<Persona>, CytaraError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            let persona = conn
                .query_row(
                    &format!("SELECT {PERSONA_COLUMNS} FROM personas WHERE name = ?1 COLLATE NOCASE"),
                    params![name],
                    row_to_persona,
                )
                .optional()?;
            Ok(persona)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List personas in registration order.
pub async fn list_personas(db: &Database, active_only: bool) -> Result<Vec<Persona>, CytaraError> {
    db.connection()
        .call(move |conn| {
            let sql = if active_only {
                format!("SELECT {PERSONA_COLUMNS} FROM personas WHERE is_active = 1 ORDER BY id ASC")
            } else {
                format!("SELECT {PERSONA_COLUMNS} FROM personas ORDER BY id ASC")
            };
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], row_to_persona)?;
            let mut personas = Vec::new();
            for row in rows {
                personas.push(row?);
            }
            Ok(personas)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Change the default language of a persona. Returns false when the
/// persona does not exist.
pub async fn set_persona_language(
    db: &Database,
    id: i64,
    language: &str,
) -> Result<bool, CytaraError> {
    let language = language.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE personas SET language = ?1 WHERE id = ?2",
                params![language, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
