use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use legal_rag_core::{
    ingest_pdf, ChatError, ChatMessage, ChatResponse, ChunkLog, CurrentDocument, IngestError, IngestionOptions,
    IngestionReport, RagOrchestrator, SearchError, Session,
};
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::backend::IndexBackend;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyQuestion => Self::bad_request("Question is required"),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::bad_request(format!("Invalid upload: {}", err.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(message) => {
                error!(error = %message, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Reduces a client-supplied file name to a flat `[A-Za-z0-9._-]` name.
pub struct FilenameSanitizer {
    disallowed: Regex,
}

impl FilenameSanitizer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            disallowed: Regex::new(r"[^A-Za-z0-9_.-]")?,
        })
    }

    pub fn sanitize(&self, filename: &str) -> String {
        let flattened = filename
            .replace(['/', '\\'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");
        self.disallowed
            .replace_all(&flattened, "")
            .trim_matches(|c| c == '.' || c == '_')
            .to_string()
    }
}

fn is_pdf(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

struct AppStateInner {
    orchestrator: RagOrchestrator,
    backend: IndexBackend,
    session: RwLock<Session>,
    uploads_dir: PathBuf,
    chunk_log: ChunkLog,
    ingestion: IngestionOptions,
    filenames: FilenameSanitizer,
    uploads: Mutex<()>,
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(
        orchestrator: RagOrchestrator,
        backend: IndexBackend,
        session: Session,
        uploads_dir: PathBuf,
        chunk_log: ChunkLog,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            inner: Arc::new(AppStateInner {
                orchestrator,
                backend,
                session: RwLock::new(session),
                uploads_dir,
                chunk_log,
                ingestion: IngestionOptions::default(),
                filenames: FilenameSanitizer::new()?,
                uploads: Mutex::new(()),
            }),
        })
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.inner.uploads_dir
    }

    fn session(&self) -> Session {
        self.inner.session.read().clone()
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let pdfs = ServeDir::new(state.uploads_dir());

    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/chat", post(chat))
        .nest_service("/pdf", pdfs)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    ok: bool,
    current_doc: Option<CurrentDocument>,
    has_retriever: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let session = state.session();
    Json(HealthResponse {
        ok: true,
        current_doc: session.document().cloned(),
        has_retriever: session.has_retriever(),
    })
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    success: bool,
    document: CurrentDocument,
    message: String,
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    let mut received = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        received = Some((original_name, bytes));
        break;
    }

    let Some((original_name, bytes)) = received else {
        return Err(ApiError::bad_request("No file provided"));
    };
    if original_name.is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }
    if !is_pdf(&original_name) {
        return Err(ApiError::bad_request("Only PDF files allowed"));
    }
    let filename = state.inner.filenames.sanitize(&original_name);
    if !is_pdf(&filename) {
        return Err(ApiError::bad_request("Only PDF files allowed"));
    }

    let _upload_guard = state.inner.uploads.lock().await;

    tokio::fs::create_dir_all(&state.inner.uploads_dir).await?;
    let path = state.inner.uploads_dir.join(&filename);
    tokio::fs::write(&path, &bytes).await?;
    info!(file = %filename, bytes = bytes.len(), "processing upload");

    let report = extract_and_log(&state, path.clone()).await?;
    let index = state.inner.backend.fresh();
    let session = state
        .inner
        .orchestrator
        .ingest(index, &report, &filename, &path.display().to_string())
        .await?;

    let document = session
        .document()
        .cloned()
        .ok_or_else(|| ApiError::internal("ingest produced no document"))?;
    *state.inner.session.write() = session;

    info!(file = %filename, chunks = document.num_chunks, pages = document.pages, "document indexed");
    Ok(Json(UploadResponse {
        success: true,
        message: format!(
            "Processed {} chunks from {} ({} pages)",
            document.num_chunks, document.filename, document.pages
        ),
        document,
    }))
}

/// Extracts chunks off the async runtime and replaces the chunk log with them.
async fn extract_and_log(state: &AppState, path: PathBuf) -> Result<IngestionReport, ApiError> {
    let options = state.inner.ingestion.clone();
    let log = state.inner.chunk_log.clone();

    tokio::task::spawn_blocking(move || -> Result<IngestionReport, ApiError> {
        let report = ingest_pdf(&path, &options).map_err(|err| {
            warn!(path = %path.display(), error = %err, "pdf extraction failed");
            ApiError::internal("Failed to extract text from PDF")
        })?;
        log.write(&report.chunks)?;
        Ok(report)
    })
    .await
    .map_err(|err| ApiError::internal(err.to_string()))?
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    question: String,
    #[serde(default)]
    history: Vec<ChatMessage>,
}

async fn chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    // Parsed by hand so clients that omit the JSON content type still get through.
    let request: ChatRequest = serde_json::from_slice(&body)
        .map_err(|err| ApiError::bad_request(format!("Invalid JSON body: {err}")))?;
    let session = state.session();

    info!(question = %request.question.trim(), "chat query");
    let response = state
        .inner
        .orchestrator
        .chat(&session, &request.question, &request.history)
        .await?;

    Ok(Json(response))
}
