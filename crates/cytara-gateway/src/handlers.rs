// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles ingest, moderation decisions, quote retrieval, health, and the
//! administrative token-cache refresh hook.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::Query;
use cytara_core::CytaraError;
use cytara_core::types::{MediaType, ModerationStatus};
use cytara_moderation::ApprovalOutcome;
use cytara_storage::models::NewSubmission;
use cytara_storage::queries;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::server::GatewayState;

/// Request body for POST /ingest/{token}/submissions.
#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub submitted_by_user_id: i64,
    pub submitted_chat_id: i64,
    #[serde(default)]
    pub submitted_by_username: Option<String>,
    #[serde(default)]
    pub submitted_by_name: Option<String>,
    #[serde(default)]
    pub quoted_user_id: Option<i64>,
    #[serde(default)]
    pub quoted_username: Option<String>,
    #[serde(default)]
    pub quoted_name: Option<String>,
    pub media_type: MediaType,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
    /// Hex-encoded content hash.
    #[serde(default)]
    pub file_hash: Option<String>,
}

/// Response body for a created submission.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub id: i64,
    pub persona_id: i64,
    pub status: ModerationStatus,
    pub created_at: String,
}

/// Request body for POST /submissions/{id}/decision.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub operator_id: i64,
    #[serde(default)]
    pub operator_chat_id: Option<i64>,
    pub action: DecisionAction,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Approve,
    Reject,
}

/// Response body for a decision.
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub submission_id: i64,
    pub status: ModerationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<i64>,
    /// Set when the payload duplicated an existing quote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_reason: Option<String>,
}

/// Query string for GET /personas/{id}/quote.
#[derive(Debug, Default, Deserialize)]
pub struct QuoteQuery {
    #[serde(default)]
    pub q: Option<String>,
    /// Repeatable: `?lang=pl&lang=en`.
    #[serde(default)]
    pub lang: Vec<String>,
}

/// Response body for a retrieved quote.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub id: i64,
    pub persona_id: i64,
    pub media_type: MediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    pub language: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_bots: usize,
}

/// Response body for POST /internal/refresh-tokens.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub active_bots: usize,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ModerationStatus>,
}

fn error_response(code: StatusCode, message: impl Into<String>) -> Response {
    (
        code,
        Json(ErrorResponse {
            error: message.into(),
            status: None,
        }),
    )
        .into_response()
}

fn map_error(err: CytaraError) -> Response {
    match err {
        CytaraError::Validation(msg) => error_response(StatusCode::BAD_REQUEST, msg),
        CytaraError::NotFound(what) => {
            error_response(StatusCode::NOT_FOUND, format!("{what} not found"))
        }
        CytaraError::IdentityMismatch(msg) => error_response(StatusCode::CONFLICT, msg),
        CytaraError::AlreadyDecided { status } => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "submission already decided".to_string(),
                status: Some(status),
            }),
        )
            .into_response(),
        other => {
            warn!(error = %other, "request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

/// POST /ingest/{token}/submissions
pub async fn post_submission(
    State(state): State<GatewayState>,
    Path(token): Path<String>,
    Json(body): Json<SubmissionRequest>,
) -> Response {
    let binding = match state.tokens.resolve(&token).await {
        Ok(Some(binding)) => binding,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "unknown bot token"),
        Err(err) => return map_error(err),
    };

    let chat_key = body.submitted_chat_id.to_string();
    let allowed = state
        .limiter
        .check(&chat_key, "ingest", state.ingest.rate_limit, state.ingest.rate_interval)
        .await;
    if !allowed {
        return error_response(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded");
    }

    let file_hash = match &body.file_hash {
        Some(encoded) => match hex::decode(encoded) {
            Ok(bytes) => Some(bytes),
            Err(_) => {
                return error_response(StatusCode::BAD_REQUEST, "file_hash is not valid hex");
            }
        },
        None => None,
    };

    let submission = NewSubmission {
        persona_id: binding.persona_id,
        submitted_by_user_id: body.submitted_by_user_id,
        submitted_chat_id: body.submitted_chat_id,
        submitted_by_username: body.submitted_by_username,
        submitted_by_name: body.submitted_by_name,
        quoted_user_id: body.quoted_user_id,
        quoted_username: body.quoted_username,
        quoted_name: body.quoted_name,
        media_type: body.media_type,
        text_content: body.text_content,
        file_id: body.file_id,
        file_hash,
    };
    match cytara_moderation::create_submission(&state.db, &submission).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(SubmissionResponse {
                id: created.id,
                persona_id: created.persona_id,
                status: created.status,
                created_at: created.created_at,
            }),
        )
            .into_response(),
        Err(err) => map_error(err),
    }
}

/// POST /submissions/{id}/decision
pub async fn post_decision(
    State(state): State<GatewayState>,
    Path(submission_id): Path<i64>,
    Json(body): Json<DecisionRequest>,
) -> Response {
    match body.action {
        DecisionAction::Approve => {
            match cytara_moderation::approve(
                &state.db,
                submission_id,
                Some(body.operator_id),
                body.operator_chat_id,
                body.language.as_deref(),
                body.notes,
            )
            .await
            {
                Ok(ApprovalOutcome::Approved { submission, quote }) => Json(DecisionResponse {
                    submission_id: submission.id,
                    status: submission.status,
                    quote_id: Some(quote.id),
                    duplicate_of: None,
                    duplicate_reason: None,
                })
                .into_response(),
                Ok(ApprovalOutcome::Duplicate {
                    submission,
                    existing,
                    reason,
                }) => Json(DecisionResponse {
                    submission_id: submission.id,
                    status: submission.status,
                    quote_id: None,
                    duplicate_of: Some(existing.id),
                    duplicate_reason: Some(reason.to_string()),
                })
                .into_response(),
                Err(err) => map_error(err),
            }
        }
        DecisionAction::Reject => {
            match cytara_moderation::reject(
                &state.db,
                submission_id,
                Some(body.operator_id),
                body.operator_chat_id,
                body.notes,
            )
            .await
            {
                Ok(submission) => Json(DecisionResponse {
                    submission_id: submission.id,
                    status: submission.status,
                    quote_id: None,
                    duplicate_of: None,
                    duplicate_reason: None,
                })
                .into_response(),
                Err(err) => map_error(err),
            }
        }
    }
}

/// GET /personas/{id}/quote
pub async fn get_quote(
    State(state): State<GatewayState>,
    Path(persona_id): Path<i64>,
    Query(query): Query<QuoteQuery>,
) -> Response {
    match queries::personas::get_persona_by_id(&state.db, persona_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "unknown persona"),
        Err(err) => return map_error(err),
    }

    let selected = cytara_quotes::select_relevant_quote(
        &state.db,
        persona_id,
        query.q.as_deref().unwrap_or(""),
        &query.lang,
        state.retrieval.search_limit,
        state.retrieval.sample_size,
    )
    .await;
    match selected {
        Ok(Some(quote)) => Json(QuoteResponse {
            id: quote.id,
            persona_id: quote.persona_id,
            media_type: quote.media_type,
            text_content: quote.text_content,
            file_id: quote.file_id,
            language: quote.language,
        })
        .into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "no result"),
        Err(err) => map_error(err),
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    match state.tokens.active_count().await {
        Ok(active_bots) => Json(HealthResponse {
            status: "ok".to_string(),
            active_bots,
        })
        .into_response(),
        Err(err) => map_error(err),
    }
}

/// POST /internal/refresh-tokens
pub async fn post_refresh_tokens(State(state): State<GatewayState>) -> Response {
    match state.tokens.refresh().await {
        Ok(active_bots) => Json(RefreshResponse { active_bots }).into_response(),
        Err(err) => map_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_request_deserializes_with_minimal_fields() {
        let json = r#"{
            "submitted_by_user_id": 111,
            "submitted_chat_id": -100,
            "media_type": "text",
            "text_content": "hello"
        }"#;
        let req: SubmissionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.submitted_by_user_id, 111);
        assert_eq!(req.media_type, MediaType::Text);
        assert!(req.quoted_user_id.is_none());
        assert!(req.file_hash.is_none());
    }

    #[test]
    fn decision_request_accepts_both_actions() {
        let approve: DecisionRequest =
            serde_json::from_str(r#"{"operator_id": 5, "action": "approve"}"#).unwrap();
        assert!(matches!(approve.action, DecisionAction::Approve));

        let reject: DecisionRequest = serde_json::from_str(
            r#"{"operator_id": 5, "action": "reject", "notes": "off topic"}"#,
        )
        .unwrap();
        assert!(matches!(reject.action, DecisionAction::Reject));
        assert_eq!(reject.notes.as_deref(), Some("off topic"));
    }

    #[test]
    fn error_response_hides_absent_status() {
        let plain = serde_json::to_string(&ErrorResponse {
            error: "nope".to_string(),
            status: None,
        })
        .unwrap();
        assert!(!plain.contains("status"));

        let decided = serde_json::to_string(&ErrorResponse {
            error: "already decided".to_string(),
            status: Some(ModerationStatus::Approved),
        })
        .unwrap();
        assert!(decided.contains("\"status\":\"approved\""));
    }

    #[test]
    fn decision_response_omits_empty_duplicate_fields() {
        let json = serde_json::to_string(&DecisionResponse {
            submission_id: 1,
            status: ModerationStatus::Approved,
            quote_id: Some(9),
            duplicate_of: None,
            duplicate_reason: None,
        })
        .unwrap();
        assert!(json.contains("\"quote_id\":9"));
        assert!(!json.contains("duplicate"));
    }
}
