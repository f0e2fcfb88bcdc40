// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end flow through the gateway router: ingest a submission via a
//! bot token, watch approval fail while the persona has no identities,
//! register the author, approve, and retrieve the resulting quote.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use cytara_gateway::{GatewayState, IngestSettings, RetrievalSettings, TokenCache, build_router};
use cytara_ratelimit::RateLimiter;
use cytara_test_utils::TestHarness;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn router_for(harness: &TestHarness, rate_limit: usize) -> Router {
    let state = GatewayState {
        db: harness.db.clone(),
        tokens: Arc::new(TokenCache::new(harness.db.clone(), Duration::from_secs(60))),
        limiter: Arc::new(RateLimiter::new()),
        ingest: IngestSettings {
            rate_limit,
            rate_interval: Duration::from_secs(60),
        },
        retrieval: RetrievalSettings {
            search_limit: 5,
            sample_size: 50,
        },
    };
    build_router(state)
}

async fn send_json(router: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

#[tokio::test]
async fn submission_flows_from_ingest_to_retrievable_quote() {
    let harness = TestHarness::new("Ada", "pl").await.unwrap();
    let router = router_for(&harness, 100);

    // Ingest through the bot token.
    let ingest_uri = format!("/ingest/{}/submissions", harness.bot_token);
    let (status, created) = send_json(
        &router,
        "POST",
        &ingest_uri,
        json!({
            "submitted_by_user_id": 111,
            "submitted_chat_id": -100,
            "submitted_by_username": "lovelace",
            "submitted_by_name": "Ada Lovelace",
            "media_type": "text",
            "text_content": "Najpierw maszyna, potem poezja"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    let submission_id = created["id"].as_i64().unwrap();

    // Approval is refused while the persona has no registered identities.
    let decision_uri = format!("/submissions/{submission_id}/decision");
    let (status, refused) = send_json(
        &router,
        "POST",
        &decision_uri,
        json!({"operator_id": 5, "action": "approve"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(
        refused["error"]
            .as_str()
            .unwrap()
            .contains("no registered identities")
    );

    // Register the author, then approval goes through.
    cytara_identity::add_identity(
        &harness.db,
        harness.persona_id,
        Some(111),
        None,
        None,
        Some(5),
        None,
    )
    .await
    .unwrap();

    let (status, decided) = send_json(
        &router,
        "POST",
        &decision_uri,
        json!({"operator_id": 5, "action": "approve"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], "approved");
    let quote_id = decided["quote_id"].as_i64().unwrap();

    // A second decision on the same submission is rejected with the
    // recorded status.
    let (status, again) = send_json(
        &router,
        "POST",
        &decision_uri,
        json!({"operator_id": 6, "action": "reject"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["status"], "approved");

    // The quote is retrievable and inherits the persona language.
    let quote_uri = format!("/personas/{}/quote?q=maszyna", harness.persona_id);
    let (status, quote) = get(&router, &quote_uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["id"].as_i64().unwrap(), quote_id);
    assert_eq!(quote["language"], "pl");

    harness.db.close().await.unwrap();
}

#[tokio::test]
async fn ingest_applies_per_chat_rate_limit() {
    let harness = TestHarness::new("Limited", "en").await.unwrap();
    let router = router_for(&harness, 5);

    let uri = format!("/ingest/{}/submissions", harness.bot_token);
    for n in 0..5 {
        let (status, _) = send_json(
            &router,
            "POST",
            &uri,
            json!({
                "submitted_by_user_id": 111,
                "submitted_chat_id": -100,
                "media_type": "text",
                "text_content": format!("burst {n}")
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send_json(
        &router,
        "POST",
        &uri,
        json!({
            "submitted_by_user_id": 111,
            "submitted_chat_id": -100,
            "media_type": "text",
            "text_content": "one too many"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate limit exceeded");

    // A different chat still gets through.
    let (status, _) = send_json(
        &router,
        "POST",
        &uri,
        json!({
            "submitted_by_user_id": 111,
            "submitted_chat_id": -200,
            "media_type": "text",
            "text_content": "different window"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    harness.db.close().await.unwrap();
}

#[tokio::test]
async fn unknown_token_and_persona_return_not_found() {
    let harness = TestHarness::new("Ghost", "en").await.unwrap();
    let router = router_for(&harness, 5);

    let (status, body) = send_json(
        &router,
        "POST",
        "/ingest/not-a-real-token/submissions",
        json!({
            "submitted_by_user_id": 111,
            "submitted_chat_id": -100,
            "media_type": "text",
            "text_content": "ignored"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown bot token");

    let (status, _) = get(&router, "/personas/9999/quote").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    harness.db.close().await.unwrap();
}

#[tokio::test]
async fn approving_a_repeated_image_reports_the_existing_quote() {
    let harness = TestHarness::new("Repeat", "en").await.unwrap();
    let router = router_for(&harness, 100);
    cytara_identity::add_identity(
        &harness.db,
        harness.persona_id,
        Some(111),
        None,
        None,
        Some(5),
        None,
    )
    .await
    .unwrap();

    let ingest_uri = format!("/ingest/{}/submissions", harness.bot_token);
    let hash = hex::encode([0xab; 32]);
    let payload = |file_id: &str| {
        json!({
            "submitted_by_user_id": 111,
            "submitted_chat_id": -100,
            "media_type": "image",
            "file_id": file_id,
            "file_hash": hash
        })
    };

    let (status, first) = send_json(&router, "POST", &ingest_uri, payload("img-one")).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, decided) = send_json(
        &router,
        "POST",
        &format!("/submissions/{}/decision", first["id"]),
        json!({"operator_id": 5, "action": "approve"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let original_quote = decided["quote_id"].as_i64().unwrap();

    // Same content hash under a fresh file id: approved, but no new quote.
    let (status, second) = send_json(&router, "POST", &ingest_uri, payload("img-two")).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, decided) = send_json(
        &router,
        "POST",
        &format!("/submissions/{}/decision", second["id"]),
        json!({"operator_id": 5, "action": "approve"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], "approved");
    assert!(decided.get("quote_id").is_none());
    assert_eq!(decided["duplicate_of"].as_i64().unwrap(), original_quote);
    assert_eq!(decided["duplicate_reason"], "file_hash");

    harness.db.close().await.unwrap();
}

#[tokio::test]
async fn health_reports_active_bot_count() {
    let harness = TestHarness::new("Probe", "en").await.unwrap();
    let router = router_for(&harness, 5);

    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["active_bots"].as_i64().unwrap(), 1);

    harness.db.close().await.unwrap();
}
