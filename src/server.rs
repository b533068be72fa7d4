//! HTTP API: the notes backend.
//!
//! | Route | Body | Answer |
//! |-------|------|--------|
//! | `GET /` | | `{"message": ...}` |
//! | `POST /generate-notes` | multipart `file`, `topic` | `{"notes": "<html>"}` |
//! | `POST /generate-notes-pdf` | multipart `file`, `topic` | `application/pdf` attachment |
//!
//! Uploads are validated before the OCR collaborator is called. Errors come
//! back as `{"error": ..., "code": ...}` with 400 for bad input, 422 when the
//! notes had nothing to render and 500 for collaborator failures.

use crate::convert::NotesPipeline;
use crate::delivery::pdf_file_name;
use crate::error::NotesError;
use crate::pipeline::input::{mime_for_path, ImageUpload};
use crate::progress::NoopProgressCallback;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<NotesPipeline>,
}

impl AppState {
    pub fn new(pipeline: NotesPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

#[derive(Serialize)]
struct NotesResponse {
    notes: String,
}

#[derive(Serialize)]
struct WelcomeResponse {
    message: &'static str,
}

fn error_code(e: &NotesError) -> &'static str {
    match e {
        NotesError::MissingInput(_) => "MISSING_INPUT",
        NotesError::Validation(_) => "INVALID_UPLOAD",
        NotesError::NoContent => "NO_CONTENT",
        NotesError::NoTextExtracted | NotesError::OcrFailed(_) => "OCR_FAILED",
        NotesError::GenerationFailed(_) => "GENERATION_FAILED",
        NotesError::RenderFailed(_) => "RENDER_FAILED",
        _ => "INTERNAL_ERROR",
    }
}

impl IntoResponse for NotesError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        } else {
            debug!("Request rejected: {}", self);
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: error_code(&self),
        });
        (status, body).into_response()
    }
}

/// Build the router. Permissive CORS so a browser front end on another
/// origin can call it.
pub fn router(state: AppState) -> Router {
    let body_limit = state.pipeline.config().max_upload_bytes * 2 + MULTIPART_OVERHEAD;
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(welcome))
        .route("/generate-notes", post(generate_notes))
        .route("/generate-notes-pdf", post(generate_notes_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve on `addr` until Ctrl+C or SIGTERM.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), NotesError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| NotesError::Internal(format!("failed to bind {addr}: {e}")))?;
    serve_on(listener, state).await
}

/// Serve on an already-bound listener until Ctrl+C or SIGTERM.
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<(), NotesError> {
    if let Ok(addr) = listener.local_addr() {
        info!("Smart Notes API listening on {}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| NotesError::Internal(format!("server error: {e}")))?;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown..."),
    }
}

async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to Smart Notes API",
    })
}

async fn generate_notes(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<NotesResponse>, NotesError> {
    let (upload, topic) = read_submission(multipart).await?;
    let notes = state
        .pipeline
        .notes(&upload, &topic, &NoopProgressCallback)
        .await?;
    Ok(Json(NotesResponse { notes }))
}

async fn generate_notes_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, NotesError> {
    let (upload, topic) = read_submission(multipart).await?;
    let today = chrono::Local::now().date_naive();
    let bytes = state
        .pipeline
        .pdf(&upload, &topic, today, &NoopProgressCallback)
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", pdf_file_name(&topic));
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Pull the `file` and `topic` fields out of a multipart body.
async fn read_submission(mut multipart: Multipart) -> Result<(ImageUpload, String), NotesError> {
    let bad_body = |e: axum::extract::multipart::MultipartError| {
        NotesError::MissingInput(format!("Invalid multipart body: {e}"))
    };

    let mut upload = None;
    let mut topic = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_body)? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| mime_for_path(&name));
                let bytes = field.bytes().await.map_err(bad_body)?;
                debug!("Received file '{}' ({}, {} bytes)", name, mime_type, bytes.len());
                upload = Some(ImageUpload::new(name, mime_type, bytes.to_vec()));
            }
            "topic" => topic = Some(field.text().await.map_err(bad_body)?),
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    let upload = upload.ok_or_else(|| NotesError::MissingInput("Please upload an image.".into()))?;
    let topic = topic.ok_or_else(|| NotesError::MissingInput("Please enter a topic.".into()))?;
    Ok((upload, topic))
}
