//! `veriport serve` -- HTTP JSON API for the verification portal.
//!
//! Exposes the upload pipeline, verification query, mutation, and listing
//! services as an async HTTP service using `axum` + `tokio`.
//!
//! Security features:
//! - Per-IP rate limiting (default: 60 req/min, configurable), which also
//!   blunts token-enumeration guessing on the public verify endpoint
//! - Optional API key authentication via VERIPORT_API_KEY env var; the
//!   public endpoints are exempt
//! - CORS headers on all responses (permissive for local dev)
//!
//! Endpoints:
//! - GET    /health            - Server status (public)
//! - GET    /verify/{token}    - Verification status for a token (public)
//! - POST   /reports           - Submit a report record with its file
//! - GET    /reports           - Recent records plus total/pending counts
//! - PATCH  /reports/{key}     - Sparse field update
//! - DELETE /reports/{key}     - Delete record, best-effort file release
//!
//! All responses use Content-Type: application/json.

mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{middleware as axum_middleware, Json, Router};
use tower_http::cors::{Any, CorsLayer};
use veriport_service::{ListingService, MutationService, UploadPipeline, VerificationService};
use veriport_storage::{FileStore, MemoryFileStore, MemoryReportStore, ReportStore};

use self::handlers::{
    handle_delete, handle_health, handle_list, handle_not_found, handle_submit, handle_update,
    handle_verify,
};
use self::middleware::{auth_middleware, rate_limit_middleware};
use self::state::{AppState, RateLimiter};

/// Maximum request body size: 16 MB (10 MiB file plus base64 overhead).
const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

/// Default rate limit: 60 requests per minute per IP.
const DEFAULT_RATE_LIMIT: u64 = 60;

/// Rate limit window duration in seconds (1 minute).
const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Start the HTTP server on the given port with in-memory backends.
///
/// Security:
/// - CORS: Permissive (`Any` origin) for local dev; tighten for production.
/// - Rate limit: Per-IP, via `VERIPORT_RATE_LIMIT` env var (default 60 req/min).
/// - API key: If `VERIPORT_API_KEY` is set, the management endpoints require
///   auth; /health and /verify stay public.
pub async fn start_server(
    port: u16,
    max_file_bytes: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn ReportStore> = Arc::new(MemoryReportStore::new());
    let files: Arc<dyn FileStore> = Arc::new(MemoryFileStore::new());

    let rate_limit = std::env::var("VERIPORT_RATE_LIMIT")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RATE_LIMIT);

    let api_key = std::env::var("VERIPORT_API_KEY")
        .ok()
        .filter(|k| !k.is_empty());

    if api_key.is_some() {
        tracing::info!("API key authentication enabled for management endpoints");
    }
    tracing::info!(rate_limit, "per-IP rate limit (requests per minute)");

    let state = Arc::new(AppState {
        upload: UploadPipeline::new(store.clone(), files.clone())
            .with_max_file_bytes(max_file_bytes),
        verifier: VerificationService::new(store.clone()),
        mutator: MutationService::new(store.clone(), files.clone()),
        listing: ListingService::new(store),
        rate_limiter: RateLimiter::new(rate_limit),
        api_key,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/verify/{token}", get(handle_verify))
        .route("/reports", get(handle_list).post(handle_submit))
        .route("/reports/{key}", patch(handle_update).delete(handle_delete))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("veriport listening on http://{addr}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server shut down");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("received shutdown signal");
}
