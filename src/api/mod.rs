pub mod preflight;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::models::TextRequest;
use crate::monitoring::metrics;
use crate::monitoring::rate_limit_middleware::{RateLimitMiddleware, RateLimitOptions};
use crate::orchestrator::Orchestrator;
use crate::security::rate_limiter::{RateLimiter, RateLimiterConfig};
use crate::store::{ResultKind, ResultStore};
use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, Resource, ResponseError};
use preflight::Preflight;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Generous enough for 50000 multi-byte characters plus JSON escaping.
const JSON_BODY_LIMIT: usize = 1024 * 1024;
const DEFAULT_RESULTS_LIMIT: usize = 10;
const MAX_RESULTS_LIMIT: usize = 100;

/// Everything handlers share, constructed once at startup.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub results: ResultStore,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, results: ResultStore, limiter: Arc<RateLimiter>) -> Self {
        Self {
            orchestrator,
            results,
            limiter,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(
            Orchestrator::from_config(config),
            ResultStore::new(config.result_store_capacity),
            Arc::new(RateLimiter::new(rate_limiter_config(config))),
        )
    }
}

pub fn rate_limiter_config(config: &ApiConfig) -> RateLimiterConfig {
    RateLimiterConfig {
        enabled: config.rate_limit_enabled,
        window: config.rate_limit_window(),
        max_requests: config.rate_limit_max_requests,
        max_keys: config.rate_limit_lru_capacity,
    }
}

#[derive(serde::Deserialize)]
struct ResultsQuery {
    limit: Option<usize>,
}

/// Generate a short request ID for correlation
fn generate_request_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

fn envelope(code: &str, message: &str) -> Value {
    json!({
        "ok": false,
        "error": { "code": code, "message": message }
    })
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            debug!(error = %err, "Rejected request body");
            ApiError::Validation("Invalid input provided".into()).into()
        })
}

fn store_result<T: Serialize>(state: &AppState, kind: ResultKind, input: &str, output: &T) {
    match serde_json::to_value(output) {
        Ok(value) => {
            state.results.save(kind, input, value);
        }
        Err(e) => warn!(error = %e, "Failed to record result in session store"),
    }
}

fn log_failure(request_id: &str, operation: &str, err: &ApiError) {
    match err {
        ApiError::Validation(_) => debug!(request_id, operation, error = %err, "Validation failed"),
        _ => error!(request_id, operation, error = %err, "Request failed"),
    }
}

async fn check_text(state: web::Data<AppState>, body: web::Json<TextRequest>) -> HttpResponse {
    let request_id = generate_request_id();
    let text = body.into_inner().text;
    info!(request_id = %request_id, chars = text.chars().count(), "AI detection requested");

    match state.orchestrator.detect(&text).await {
        Ok(result) => {
            metrics::record_request("check", "ok");
            store_result(&state, ResultKind::Detector, &text, &result);
            HttpResponse::Ok().json(result)
        }
        Err(e) => {
            metrics::record_request("check", e.code());
            log_failure(&request_id, "check", &e);
            e.error_response()
        }
    }
}

async fn humanize_text(state: web::Data<AppState>, body: web::Json<TextRequest>) -> HttpResponse {
    let request_id = generate_request_id();
    let text = body.into_inner().text;
    info!(request_id = %request_id, chars = text.chars().count(), "Humanization requested");

    match state.orchestrator.humanize(&text).await {
        Ok(result) => {
            metrics::record_request("humanize", "ok");
            store_result(&state, ResultKind::Humanizer, &text, &result);
            HttpResponse::Ok().json(result)
        }
        Err(e) => {
            metrics::record_request("humanize", e.code());
            log_failure(&request_id, "humanize", &e);
            e.error_response()
        }
    }
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    let has_api_key = !state.orchestrator.is_mock_mode();
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "hasApiKey": has_api_key,
        "devMode": !has_api_key
    }))
}

async fn list_results(state: web::Data<AppState>, query: web::Query<ResultsQuery>) -> HttpResponse {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RESULTS_LIMIT)
        .clamp(1, MAX_RESULTS_LIMIT);
    let results = state.results.recent(limit);
    HttpResponse::Ok().json(json!({
        "results": results,
        "count": results.len(),
        "total": state.results.len()
    }))
}

async fn get_result(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let found = Uuid::parse_str(&path.into_inner())
        .ok()
        .and_then(|id| state.results.get(&id));
    match found {
        Some(result) => HttpResponse::Ok().json(result),
        None => HttpResponse::NotFound().json(envelope("NOT_FOUND", "Result not found")),
    }
}

async fn rate_limit_info(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.limiter.snapshot())
}

/// Prometheus text format, outside /api so scrapes are not rate limited.
async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4; charset=utf-8")
        .body(metrics::export_prometheus())
}

async fn root_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("AI detector & humanizer API is running\n\nTry GET /api/health\n")
}

async fn method_fallback() -> HttpResponse {
    HttpResponse::build(StatusCode::METHOD_NOT_ALLOWED)
        .json(envelope("METHOD_NOT_ALLOWED", "Method not allowed"))
}

/// App-wide default service.
pub async fn fallback() -> HttpResponse {
    HttpResponse::NotFound().json(envelope("NOT_FOUND", "Route not found"))
}

fn resource(path: &str) -> Resource {
    web::resource(path).default_service(web::to(method_fallback))
}

/// CORS headers on actual responses; preflights never get here, `Preflight` answers them.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

/// Route table; shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::scope("/api")
                .service(resource("/check").route(web::post().to(check_text)))
                .service(resource("/humanize").route(web::post().to(humanize_text)))
                .service(resource("/health").route(web::get().to(health)))
                .service(resource("/results").route(web::get().to(list_results)))
                .service(resource("/results/{id}").route(web::get().to(get_result)))
                .service(resource("/rate-limit").route(web::get().to(rate_limit_info))),
        )
        .service(resource("/metrics").route(web::get().to(get_metrics)))
        .service(resource("/").route(web::get().to(root_handler)));
}

fn spawn_rate_limit_sweeper(limiter: Arc<RateLimiter>, every: Duration) {
    actix_web::rt::spawn(async move {
        let mut ticker = actix_web::rt::time::interval(every);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep_expired();
            if removed > 0 {
                debug!(removed, "Swept expired rate limit windows");
            }
        }
    });
}

pub async fn start_api_server(config: &ApiConfig) -> std::io::Result<()> {
    let bind_addr = config.bind_addr();
    let state = web::Data::new(AppState::from_config(config));
    let limiter = Arc::clone(&state.limiter);
    let opts = RateLimitOptions {
        trust_proxy: config.trust_proxy,
        ..RateLimitOptions::default()
    };

    info!(
        enabled = config.rate_limit_enabled,
        window_secs = config.rate_limit_window_secs,
        max_requests = config.rate_limit_max_requests,
        trust_proxy = opts.trust_proxy,
        protected = ?opts.protected_prefixes,
        "Rate limit options initialized"
    );

    if config.rate_limit_sweep_secs > 0 {
        spawn_rate_limit_sweeper(
            Arc::clone(&limiter),
            Duration::from_secs(config.rate_limit_sweep_secs),
        );
    }

    let mut http_server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors())
            .wrap(Preflight)
            // Registered last, so it runs first: rejected requests never reach CORS or handlers
            .wrap(RateLimitMiddleware::new_with_options(
                Arc::clone(&limiter),
                opts.clone(),
            ))
            .configure(configure)
            .default_service(web::to(fallback))
    });
    if let Some(workers) = config.workers {
        http_server = http_server.workers(workers);
    }

    info!("Starting API server on http://{}", bind_addr);
    http_server.bind(&bind_addr)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_is_short() {
        assert_eq!(generate_request_id().len(), 8);
    }
}
