//! HTTP surface: one POST endpoint per artifact kind.
//!
//! | Route                     | Body                                   |
//! |---------------------------|----------------------------------------|
//! | `POST /flashcards/generate` | `{fileDownloadUrl, customPrompt?}`   |
//! | `POST /mindmaps/generate`   | `{fileDownloadUrl, customPrompt?}`   |
//! | `POST /quizzes/generate`    | `{fileDownloadUrl}`                  |
//! | `GET /health`               |                                      |
//!
//! Success returns the artifact JSON unchanged. Failures return
//! `{"error", "stage", "message"}` with the status from
//! [`StudyGenError::status_code`]; provider payloads never reach the body.

use crate::artifact::ArtifactKind;
use crate::error::StudyGenError;
use crate::generate::{ArtifactGenerator, ArtifactRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Request body shared by the three generate endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    pub file_download_url: String,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

/// Error response wrapper around [`StudyGenError`].
pub struct ApiError(StudyGenError);

impl From<StudyGenError> for ApiError {
    fn from(err: StudyGenError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("{} failed at {}: {}", err.kind(), err.stage(), err);
        } else {
            warn!("{} rejected at {}: {}", err.kind(), err.stage(), err);
        }

        let body = Json(json!({
            "error": err.kind().as_str(),
            "stage": err.stage(),
            "message": err.public_message(),
        }));

        (status, body).into_response()
    }
}

/// Build the router. The generator is shared by every request.
pub fn router(generator: Arc<ArtifactGenerator>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/flashcards/generate", post(flashcards_handler))
        .route("/mindmaps/generate", post(mindmaps_handler))
        .route("/quizzes/generate", post(quizzes_handler))
        .with_state(generator)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(addr: SocketAddr, generator: Arc<ArtifactGenerator>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(generator)).await
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn flashcards_handler(
    State(generator): State<Arc<ArtifactGenerator>>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    run(&generator, ArtifactKind::Flashcards, body).await
}

async fn mindmaps_handler(
    State(generator): State<Arc<ArtifactGenerator>>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    run(&generator, ArtifactKind::Mindmap, body).await
}

async fn quizzes_handler(
    State(generator): State<Arc<ArtifactGenerator>>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    run(&generator, ArtifactKind::Quiz, body).await
}

async fn run(
    generator: &ArtifactGenerator,
    kind: ArtifactKind,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|e| StudyGenError::InvalidRequest(e.body_text()))?;
    let request = ArtifactRequest {
        kind,
        file_download_url: body.file_download_url,
        custom_prompt: body.custom_prompt,
    };
    let result = generator.generate(&request).await?;
    Ok(Json(result).into_response())
}
