//! Core HTTP route handlers: health, verify, submit, list, update, delete.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use veriport_core::{FilePayload, ReportDraft};
use veriport_service::{MutationError, ReportPatch, UploadError, DEFAULT_PAGE_LIMIT};

use super::json_error;
use super::state::AppState;

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

/// GET /verify/{token}
///
/// Public. The response shape is fixed: `{status, data}` with `data` null
/// unless the status is Valid. Unknown tokens look exactly like invalid
/// records.
pub(crate) async fn handle_verify(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    match state.verifier.verify(&token).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "verification lookup failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed. Please try again.",
            )
            .into_response()
        }
    }
}

/// The submission body. Fields default so that missing values surface as
/// field-level validation errors rather than a deserialization failure.
#[derive(Deserialize)]
struct SubmitRequest {
    #[serde(rename = "studentId", default)]
    student_id: String,
    #[serde(rename = "studentName", default)]
    student_name: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    file: Option<FileUpload>,
}

#[derive(Deserialize)]
struct FileUpload {
    #[serde(default)]
    filename: String,
    #[serde(rename = "mediaType", default)]
    media_type: String,
    #[serde(rename = "dataBase64")]
    data_base64: String,
}

/// POST /reports
pub(crate) async fn handle_submit(
    State(state): State<Arc<AppState>>,
    Json(parsed): Json<serde_json::Value>,
) -> impl IntoResponse {
    let request: SubmitRequest = match serde_json::from_value(parsed) {
        Ok(r) => r,
        Err(e) => {
            return json_error(StatusCode::BAD_REQUEST, &format!("malformed request: {e}"))
                .into_response()
        }
    };

    let file = match request.file {
        Some(f) => match BASE64.decode(f.data_base64.as_bytes()) {
            Ok(bytes) => Some(FilePayload {
                filename: f.filename,
                media_type: f.media_type,
                bytes,
            }),
            Err(_) => {
                return json_error(StatusCode::BAD_REQUEST, "file payload is not valid base64")
                    .into_response()
            }
        },
        None => None,
    };

    let draft = ReportDraft {
        student_id: request.student_id,
        student_name: request.student_name,
        class: request.class,
        year: request.year,
        status: request.status,
    };

    match state.upload.submit(&draft, file).await {
        Ok(receipt) => {
            let response = serde_json::json!({
                "token": receipt.token.as_str(),
                "recordKey": receipt.record_key,
                "fileUrl": receipt.file_url,
            });
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(UploadError::Validation(e)) => {
            let response = serde_json::json!({
                "error": "Invalid form data.",
                "fields": e.fields,
            });
            (StatusCode::BAD_REQUEST, Json(response)).into_response()
        }
        Err(UploadError::File(e)) => {
            json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response()
        }
        Err(e) => {
            // Store transport detail stays server-side.
            tracing::error!(error = %e, "upload failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Upload failed. Please try again.",
            )
            .into_response()
        }
    }
}

/// GET /reports
pub(crate) async fn handle_list(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.listing.page(DEFAULT_PAGE_LIMIT).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "listing failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch reports")
                .into_response()
        }
    }
}

/// PATCH /reports/{key}
pub(crate) async fn handle_update(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(parsed): Json<serde_json::Value>,
) -> impl IntoResponse {
    let patch: ReportPatch = match serde_json::from_value(parsed) {
        Ok(p) => p,
        Err(e) => {
            return json_error(StatusCode::BAD_REQUEST, &format!("malformed request: {e}"))
                .into_response()
        }
    };

    match state.mutator.update(&key, patch).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"success": true}))).into_response(),
        Err(e) => mutation_error_response(e),
    }
}

/// DELETE /reports/{key}
pub(crate) async fn handle_delete(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    match state.mutator.delete(&key).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"success": true}))).into_response(),
        Err(e) => mutation_error_response(e),
    }
}

fn mutation_error_response(e: MutationError) -> axum::response::Response {
    match e {
        MutationError::NotFound { .. } => {
            json_error(StatusCode::NOT_FOUND, "Report not found").into_response()
        }
        MutationError::Validation(e) => {
            let response = serde_json::json!({
                "error": "Invalid form data.",
                "fields": e.fields,
            });
            (StatusCode::BAD_REQUEST, Json(response)).into_response()
        }
        MutationError::Store(e) => {
            tracing::error!(error = %e, "mutation failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Operation failed. Please try again.",
            )
            .into_response()
        }
    }
}
