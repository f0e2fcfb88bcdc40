// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cytara status` command implementation.
//!
//! Reads the database directly and reports per-persona corpus sizes and
//! the moderation queue depth, as text or JSON.

use cytara_config::CytaraConfig;
use cytara_core::CytaraError;
use cytara_storage::{Database, queries};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PersonaStatus {
    id: i64,
    name: String,
    language: String,
    active: bool,
    identities: i64,
    quotes_total: i64,
    quotes_text: i64,
    quotes_image: i64,
    quotes_audio: i64,
    pending: i64,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    platform: String,
    database_path: String,
    active_bots: usize,
    pending_total: i64,
    personas: Vec<PersonaStatus>,
}

/// Run the `cytara status` command.
pub async fn run_status(config: &CytaraConfig, json: bool) -> Result<(), CytaraError> {
    let db =
        Database::open_with_wal(&config.storage.database_path, config.storage.wal_mode).await?;
    let report = collect_report(&db, config).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| CytaraError::Internal(format!("status serialization failed: {e}")))?;
        println!("{rendered}");
    } else {
        print_report(&report);
    }
    Ok(())
}

async fn collect_report(
    db: &Database,
    config: &CytaraConfig,
) -> Result<StatusReport, CytaraError> {
    let bindings = queries::bots::list_active_bindings(db).await?;
    let pending_total = queries::submissions::count_pending(db, None).await?;

    let mut personas = Vec::new();
    for persona in queries::personas::list_personas(db, false).await? {
        let stats = queries::quotes::quote_stats(db, persona.id).await?;
        let pending = queries::submissions::count_pending(db, Some(persona.id)).await?;
        let identities = queries::identities::count_active_identities(db, persona.id).await?;
        personas.push(PersonaStatus {
            id: persona.id,
            name: persona.name,
            language: persona.language,
            active: persona.is_active,
            identities,
            quotes_total: stats.total,
            quotes_text: stats.text,
            quotes_image: stats.image,
            quotes_audio: stats.audio,
            pending,
        });
    }

    Ok(StatusReport {
        platform: config.platform.name.clone(),
        database_path: config.storage.database_path.clone(),
        active_bots: bindings.len(),
        pending_total,
        personas,
    })
}

fn print_report(report: &StatusReport) {
    println!("{} status", report.platform);
    println!("  database:    {}", report.database_path);
    println!("  active bots: {}", report.active_bots);
    println!("  pending:     {}", report.pending_total);

    if report.personas.is_empty() {
        println!("  no personas registered");
        return;
    }

    println!("  personas:");
    for persona in &report.personas {
        let marker = if persona.active { "" } else { " (inactive)" };
        println!(
            "    #{} {}{} [{}]: {} identities, {} quotes ({} text, {} image, {} audio), {} pending",
            persona.id,
            persona.name,
            marker,
            persona.language,
            persona.identities,
            persona.quotes_total,
            persona.quotes_text,
            persona.quotes_image,
            persona.quotes_audio,
            persona.pending,
        );
    }
}
