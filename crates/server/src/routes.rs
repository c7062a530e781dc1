//! HTTP routes.
//!
//! | Method | Path                | Handler       |
//! |--------|---------------------|---------------|
//! | GET    | `/`                 | [`health`]    |
//! | POST   | `/upload`           | [`upload`]    |
//! | GET    | `/files`            | [`list_files`]|
//! | GET    | `/files/{filename}` | [`download`]  |

use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use futures_util::TryStreamExt;
use tokio_util::io::StreamReader;

use lanshare_protocol::{
    ErrorResponse, FILE_FIELD, FILES_ROUTE, FileListResponse, HEALTH_ROUTE, HealthResponse,
    UPLOAD_ROUTE, UploadResponse, encode_path_segment,
};
use lanshare_transfer::TransferError;

use crate::storage::{Storage, StoredFile};

/// Download route pattern.
const DOWNLOAD_ROUTE: &str = "/files/{filename}";

/// Errors surfaced by route handlers, rendered as JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("File not found")]
    NotFound,

    #[error("missing multipart field `{0}`")]
    MissingField(&'static str),

    #[error("{0}")]
    Multipart(#[from] MultipartError),

    #[error("{0}")]
    Transfer(#[from] TransferError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::NotFound => (StatusCode::NOT_FOUND, ErrorResponse::detail(self.to_string())),
            Self::MissingField(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::error(self.to_string()),
            ),
            Self::Multipart(_) | Self::Transfer(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::error(self.to_string()),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the application router over `storage`.
///
/// The request body limit is lifted so uploads of any size stream through.
pub fn router(storage: Storage) -> Router {
    Router::new()
        .route(HEALTH_ROUTE, get(health))
        .route(UPLOAD_ROUTE, post(upload))
        .route(FILES_ROUTE, get(list_files))
        .route(DOWNLOAD_ROUTE, get(download))
        .layer(DefaultBodyLimit::disable())
        .with_state(storage)
}

/// Liveness check.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Streams the `file` field of a multipart body into storage.
async fn upload(
    State(storage): State<Storage>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let reader = StreamReader::new(field.map_err(std::io::Error::other));

        let stored = storage.store(&original_name, reader).await.map_err(|e| {
            tracing::error!(original = %original_name, "upload failed: {e}");
            e
        })?;
        return Ok(Json(UploadResponse::success(stored.filename)));
    }

    tracing::warn!("upload request without a `{FILE_FIELD}` field");
    Err(ApiError::MissingField(FILE_FIELD))
}

/// Lists the storage directory.
async fn list_files(State(storage): State<Storage>) -> Result<Json<FileListResponse>, ApiError> {
    let files = storage.list().await?;
    Ok(Json(FileListResponse {
        files: files.into_iter().map(Into::into).collect(),
    }))
}

/// Streams a stored file back as an attachment.
async fn download(
    State(storage): State<Storage>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let (file, reader) = storage.open(&filename).await.map_err(|e| match e {
        TransferError::InvalidName(_) => ApiError::NotFound,
        e if e.is_not_found() => ApiError::NotFound,
        e => ApiError::Transfer(e),
    })?;

    tracing::info!(filename = %file.filename, size = file.size, "serving download");

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static(file.content_type),
        ),
        (header::CONTENT_LENGTH, HeaderValue::from(file.size)),
        (header::CONTENT_DISPOSITION, content_disposition(&file)),
    ];
    Ok((headers, Body::from_stream(reader.into_stream())).into_response())
}

/// `attachment; filename="..."`, switching to the RFC 5987 `filename*` form
/// when the name needs escaping.
fn content_disposition(file: &StoredFile) -> HeaderValue {
    let encoded = encode_path_segment(&file.filename);
    let value = if encoded == file.filename {
        format!("attachment; filename=\"{}\"", file.filename)
    } else {
        format!("attachment; filename*=utf-8''{encoded}")
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
