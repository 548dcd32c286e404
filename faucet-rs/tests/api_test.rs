//! End-to-end tests for the faucet HTTP API
//!
//! The router is driven in-process; disbursements go to a mock.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use faucet_rs::api::handlers::{MessageResponse, ResetResponse};
use faucet_rs::api::{AppState, FaucetServer};
use faucet_rs::disburse::{Coin, Disburser, MockDisburser, MockOutcome};
use faucet_rs::ledger::{Ledger, LedgerEntry, LedgerStore};
use faucet_rs::scheduler::ResetScheduler;
use faucet_rs::{Clock, FaucetService, QuotaEngine};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
}

const ADMIN_TOKEN: &str = "admin-s3cret";

async fn app(ledger_path: &Path, disburser: Option<Arc<dyn Disburser>>) -> Router {
    app_with_admin(ledger_path, disburser, Some(ADMIN_TOKEN)).await
}

async fn app_with_admin(
    ledger_path: &Path,
    disburser: Option<Arc<dyn Disburser>>,
    admin_token: Option<&str>,
) -> Router {
    let clock = Clock::Fixed(today());
    let engine = Arc::new(
        QuotaEngine::open(LedgerStore::new(ledger_path), 2)
            .await
            .unwrap(),
    );
    let service = Arc::new(FaucetService::new(
        engine.clone(),
        disburser,
        Coin::new(100_000, "uosmo"),
        clock,
    ));
    let scheduler = Arc::new(ResetScheduler::new(engine, clock));

    let state = AppState {
        service,
        scheduler,
        admin_token: admin_token.map(str::to_string),
    };
    FaucetServer::new(state, "127.0.0.1:0").router()
}

fn mocked(mock: &Arc<MockDisburser>) -> Option<Arc<dyn Disburser>> {
    let disburser: Arc<dyn Disburser> = mock.clone();
    Some(disburser)
}

async fn post_wallet(app: &Router, body: Value) -> (StatusCode, MessageResponse) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn reset_request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri("/admin/reset");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_daily_limit_over_http() {
    let dir = tempdir().unwrap();
    let mock = Arc::new(MockDisburser::new());
    let app = app(&dir.path().join("requests.json"), mocked(&mock)).await;

    let (status, body) = post_wallet(&app, json!({"wallet": "osmo1abc"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.message, "Successfully sent 100000uosmo to osmo1abc");
    assert!(body.tx_hash.is_some());

    let (status, _) = post_wallet(&app, json!({"wallet": "osmo1abc"})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_wallet(&app, json!({"wallet": "osmo1abc"})).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body.message, "This wallet has reached its daily request limit.");
    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn test_missing_wallet_is_bad_request() {
    let dir = tempdir().unwrap();
    let app = app(
        &dir.path().join("requests.json"),
        mocked(&Arc::new(MockDisburser::new())),
    )
    .await;

    let (status, body) = post_wallet(&app, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.message, "Wallet address is required.");

    let (status, _) = post_wallet(&app, json!({"wallet": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let dir = tempdir().unwrap();
    let app = app(
        &dir.path().join("requests.json"),
        mocked(&Arc::new(MockDisburser::new())),
    )
    .await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unconfigured_service() {
    let dir = tempdir().unwrap();
    let app = app(&dir.path().join("requests.json"), None).await;

    let (status, body) = post_wallet(&app, json!({"wallet": "osmo1abc"})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body.message, "Disbursement service not configured.");
}

#[tokio::test]
async fn test_failed_disbursement_can_be_retried() {
    let dir = tempdir().unwrap();
    let mock = Arc::new(MockDisburser::scripted([MockOutcome::FailureCode(13)]));
    let app = app(&dir.path().join("requests.json"), mocked(&mock)).await;

    let (status, body) = post_wallet(&app, json!({"wallet": "osmo1abc"})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.message.starts_with("Failed to send tokens."));

    let (_, usage) = get_json(&app, "/quota/osmo1abc").await;
    assert_eq!(usage["used"], 0);

    let (status, _) = post_wallet(&app, json!({"wallet": "osmo1abc"})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post_wallet(&app, json!({"wallet": "osmo1abc"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mock.calls(), 3);
}

#[tokio::test]
async fn test_quota_status_endpoint() {
    let dir = tempdir().unwrap();
    let app = app(
        &dir.path().join("requests.json"),
        mocked(&Arc::new(MockDisburser::new())),
    )
    .await;

    post_wallet(&app, json!({"wallet": "osmo1abc"})).await;

    let (status, usage) = get_json(&app, "/quota/osmo1abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        usage,
        json!({
            "identity": "osmo1abc",
            "day": "2024-05-10",
            "used": 1,
            "remaining": 1,
            "limit": 2
        })
    );
}

#[tokio::test]
async fn test_usage_survives_restart() {
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("requests.json");

    {
        let app = app(&ledger_path, mocked(&Arc::new(MockDisburser::new()))).await;
        post_wallet(&app, json!({"wallet": "osmo1abc"})).await;
        post_wallet(&app, json!({"wallet": "osmo1abc"})).await;
    }

    let mock = Arc::new(MockDisburser::new());
    let app = app(&ledger_path, mocked(&mock)).await;
    let (status, _) = post_wallet(&app, json!({"wallet": "osmo1abc"})).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_admin_reset_prunes_stale_entries() {
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("requests.json");
    let yesterday = today().pred_opt().unwrap();

    let mut ledger = Ledger::new();
    ledger.insert("osmo1old", LedgerEntry { count: 2, day: yesterday });
    ledger.insert("osmo1idle", LedgerEntry { count: 1, day: yesterday });
    LedgerStore::new(&ledger_path).save(&ledger).await.unwrap();

    let app = app(&ledger_path, mocked(&Arc::new(MockDisburser::new()))).await;

    // Stale usage never blocks today, reset or not
    let (status, _) = post_wallet(&app, json!({"wallet": "osmo1old"})).await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .clone()
        .oneshot(reset_request(Some(ADMIN_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let reset: ResetResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(reset.removed, 1);

    let persisted = LedgerStore::new(&ledger_path).load().await.unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted.count_on("osmo1old", today()), 1);
    assert!(persisted.get("osmo1idle").is_none());
}

#[tokio::test]
async fn test_admin_reset_requires_token() {
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("requests.json");
    let yesterday = today().pred_opt().unwrap();

    let mut ledger = Ledger::new();
    ledger.insert("osmo1old", LedgerEntry { count: 2, day: yesterday });
    LedgerStore::new(&ledger_path).save(&ledger).await.unwrap();

    let app = app(&ledger_path, None).await;

    for token in [None, Some("wrong")] {
        let response = app.clone().oneshot(reset_request(token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Nothing was pruned
    let persisted = LedgerStore::new(&ledger_path).load().await.unwrap();
    assert!(persisted.get("osmo1old").is_some());
}

#[tokio::test]
async fn test_admin_reset_unmounted_without_token() {
    let dir = tempdir().unwrap();
    let app = app_with_admin(&dir.path().join("requests.json"), None, None).await;

    let response = app.oneshot(reset_request(Some(ADMIN_TOKEN))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let dir = tempdir().unwrap();
    let app = app(&dir.path().join("requests.json"), None).await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight() {
    let dir = tempdir().unwrap();
    let app = app(&dir.path().join("requests.json"), None).await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/")
        .header(header::ORIGIN, "https://faucet.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
