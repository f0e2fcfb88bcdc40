// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingest bot bindings. The gateway's token cache is rebuilt from
//! [`list_active_bindings`]; only active bots of active personas count.

use cytara_core::CytaraError;
use rusqlite::params;

use crate::database::Database;
use crate::models::BotBinding;

/// Register an ingest bot for a persona and return the binding.
pub async fn insert_bot_binding(
    db: &Database,
    persona_id: i64,
    api_token: &str,
    display_name: &str,
) -> Result<BotBinding, CytaraError> {
    let api_token = api_token.to_string();
    let display_name = display_name.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bots (persona_id, api_token, display_name) VALUES (?1, ?2, ?3)",
                params![persona_id, api_token, display_name],
            )?;
            let id = conn.last_insert_rowid();
            let binding = conn.query_row(
                "SELECT id, persona_id, api_token, display_name FROM bots WHERE id = ?1",
                params![id],
                |row| {
                    Ok(BotBinding {
                        bot_id: row.get(0)?,
                        persona_id: row.get(1)?,
                        api_token: row.get(2)?,
                        display_name: row.get(3)?,
                    })
                },
            )?;
            Ok(binding)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All bindings eligible to serve ingest traffic.
pub async fn list_active_bindings(db: &Database) -> Result<Vec<BotBinding>, CytaraError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT b.id, b.persona_id, b.api_token, b.display_name
                 FROM bots b
                 JOIN personas p ON p.id = b.persona_id
                 WHERE b.is_active = 1 AND p.is_active = 1
                 ORDER BY b.id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(BotBinding {
                    bot_id: row.get(0)?,
                    persona_id: row.get(1)?,
                    api_token: row.get(2)?,
                    display_name: row.get(3)?,
                })
            })?;
            let mut bindings = Vec::new();
            for row in rows {
                bindings.push(row?);
            }
            Ok(bindings)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Take a bot out of rotation. Returns false when the id does not exist.
pub async fn deactivate_bot(db: &Database, bot_id: i64) -> Result<bool, CytaraError> {
    db.connection()
        .call(move |conn| {
            let changed =
                conn.execute("UPDATE bots SET is_active = 0 WHERE id = ?1", params![bot_id])?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
