// File: tests/router_client_test.rs
// Purpose: Exercise the reqwest router client against a local fake upstream
//
// Run with: cargo test --test router_client_test -- --nocapture

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};
use std::time::Duration;

use humanizer::error::ApiError;
use humanizer::llm::{CompletionProvider, MockResponder, RouterClient};
use humanizer::models::Confidence;
use humanizer::orchestrator::{Orchestrator, OrchestratorSettings};

const TEST_KEY: &str = "test-key";

// ───────────────────────────────────────────────────────────────────────────
// Fake upstream
// ───────────────────────────────────────────────────────────────────────────

fn authorized(req: &HttpRequest) -> bool {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TEST_KEY))
        .unwrap_or(false)
}

/// Echoes the request fields back as generated text.
async fn echo(req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
    if !authorized(&req) {
        return HttpResponse::Unauthorized().finish();
    }
    HttpResponse::Ok().json(json!({
        "output": format!("model={} input={}", body["model"].as_str().unwrap_or(""), body["input"].as_str().unwrap_or(""))
    }))
}

async fn text_field() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "text": "from text field" }))
}

async fn verdict() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "output": "```json\n{\"ai_probability\": 85, \"confidence\": \"Very confident\", \"reasoning\": \"Uniform cadence.\"}\n```"
    }))
}

async fn unavailable() -> HttpResponse {
    HttpResponse::ServiceUnavailable().finish()
}

async fn not_json() -> HttpResponse {
    HttpResponse::Ok().content_type("text/html").body("<html>oops</html>")
}

async fn slow() -> HttpResponse {
    actix_web::rt::time::sleep(Duration::from_secs(5)).await;
    HttpResponse::Ok().json(json!({ "output": "too late" }))
}

/// Bind on an ephemeral port and return the base URL.
fn spawn_upstream() -> String {
    let server = HttpServer::new(|| {
        App::new()
            .route("/echo", web::post().to(echo))
            .route("/text", web::post().to(text_field))
            .route("/verdict", web::post().to(verdict))
            .route("/unavailable", web::post().to(unavailable))
            .route("/not-json", web::post().to(not_json))
            .route("/slow", web::post().to(slow))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind fake upstream");
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}", addr)
}

fn client(base: &str, path: &str, key: Option<&str>) -> RouterClient {
    RouterClient::new(
        format!("{}{}", base, path),
        key.map(str::to_string),
        "deepseek-r3".into(),
    )
}

// ───────────────────────────────────────────────────────────────────────────
// Client behaviour
// ───────────────────────────────────────────────────────────────────────────

#[actix_web::test]
async fn test_sends_model_input_and_bearer_token() {
    let base = spawn_upstream();
    let payload = client(&base, "/echo", Some(TEST_KEY))
        .complete("hello there")
        .await
        .unwrap();
    assert_eq!(
        payload.output.as_deref(),
        Some("model=deepseek-r3 input=hello there")
    );
}

#[actix_web::test]
async fn test_wrong_key_surfaces_status() {
    let base = spawn_upstream();
    let err = client(&base, "/echo", Some("other-key"))
        .complete("hello")
        .await
        .unwrap_err();
    match err {
        ApiError::UpstreamError { status, status_text } => {
            assert_eq!(status, 401);
            assert_eq!(status_text, "Unauthorized");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[actix_web::test]
async fn test_text_field_is_accepted() {
    let base = spawn_upstream();
    let payload = client(&base, "/text", Some(TEST_KEY))
        .complete("hello")
        .await
        .unwrap();
    assert_eq!(payload.output, None);
    assert_eq!(payload.text.as_deref(), Some("from text field"));
}

#[actix_web::test]
async fn test_error_status_is_reported() {
    let base = spawn_upstream();
    let err = client(&base, "/unavailable", Some(TEST_KEY))
        .complete("hello")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Router API error: 503 Service Unavailable");
}

#[actix_web::test]
async fn test_non_json_body_is_transport_error() {
    let base = spawn_upstream();
    let err = client(&base, "/not-json", Some(TEST_KEY))
        .complete("hello")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[actix_web::test]
async fn test_slow_upstream_times_out() {
    let base = spawn_upstream();
    let err = client(&base, "/slow", Some(TEST_KEY))
        .complete_within("hello", Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::UpstreamTimeout { .. }));
    assert_eq!(
        err.to_string(),
        "Request timeout - please try with a shorter text"
    );
}

#[actix_web::test]
async fn test_missing_key_never_connects() {
    // Nothing listens here; a network attempt would surface as Transport
    let err = client("http://127.0.0.1:9", "/echo", None)
        .complete("hello")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::UpstreamUnconfigured));
}

// ───────────────────────────────────────────────────────────────────────────
// Orchestrator over the real client
// ───────────────────────────────────────────────────────────────────────────

#[actix_web::test]
async fn test_detect_end_to_end_through_fenced_json() {
    let base = spawn_upstream();
    let orchestrator = Orchestrator::new(
        Some(std::sync::Arc::new(client(&base, "/verdict", Some(TEST_KEY)))),
        MockResponder::with_seed(1),
        OrchestratorSettings::default(),
    );

    let result = orchestrator.detect("Some essay text").await.unwrap();
    assert_eq!(result.ai_probability, 85);
    assert_eq!(result.confidence, Confidence::VeryConfident);
    assert_eq!(result.reasoning, "Uniform cadence.");
}

#[actix_web::test]
async fn test_humanize_timeout_through_orchestrator() {
    let base = spawn_upstream();
    let settings = OrchestratorSettings {
        upstream_timeout: Duration::from_millis(200),
        ..OrchestratorSettings::default()
    };
    let orchestrator = Orchestrator::new(
        Some(std::sync::Arc::new(client(&base, "/slow", Some(TEST_KEY)))),
        MockResponder::with_seed(1),
        settings,
    );

    let err = orchestrator.humanize("short text").await.unwrap_err();
    assert!(matches!(err, ApiError::UpstreamTimeout { .. }));
    assert_eq!(err.code(), "SERVER_ERROR");
}
