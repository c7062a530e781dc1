//! HTTP client for the LanShare server.
//!
//! Uploads stream the local file through a multipart body one chunk at a
//! time; downloads persist the response body through a [`ChunkedWriter`].
//! Neither direction holds more than one chunk in memory.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::TryStreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use tokio_util::io::StreamReader;

use lanshare_protocol::{
    DEFAULT_PORT, FILE_FIELD, FILES_ROUTE, FileEntry, FileListResponse, HEALTH_ROUTE,
    HealthResponse, UPLOAD_ROUTE, UploadResponse, file_route,
};
use lanshare_transfer::{
    ChunkedReader, ChunkedWriter, DEFAULT_CHUNK_SIZE, Direction, ProgressCallback,
    ProgressTracker, TransferError, TransferSession,
};

use crate::ClientError;

/// Content type sent for every uploaded part.
const UPLOAD_MIME: &str = "application/octet-stream";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Deadline for a whole upload request.
    pub upload_timeout: Duration,
    /// Deadline for a whole download request.
    pub download_timeout: Duration,
    pub connect_timeout: Duration,
    pub chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://127.0.0.1:{DEFAULT_PORT}"),
            upload_timeout: Duration::from_secs(60),
            download_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ClientConfig {
    /// Default configuration targeting `http://{host}:{port}`.
    pub fn for_server(host: &str, port: u16) -> Self {
        Self {
            base_url: format!("http://{host}:{port}"),
            ..Self::default()
        }
    }
}

/// Async client for upload, download, listing and liveness checks.
#[derive(Debug, Clone)]
pub struct TransferClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl TransferClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ClientError::Http)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), route)
    }

    /// Liveness check; returns the server's status string.
    pub async fn health(&self) -> Result<String, ClientError> {
        let resp = self
            .http
            .get(self.url(HEALTH_ROUTE))
            .timeout(self.config.connect_timeout)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let body: HealthResponse = resp.json().await?;
        Ok(body.status)
    }

    /// Lists the files currently stored on the server.
    pub async fn list_files(&self) -> Result<Vec<FileEntry>, ClientError> {
        let resp = self
            .http
            .get(self.url(FILES_ROUTE))
            .timeout(self.config.download_timeout)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let body: FileListResponse = resp.json().await?;
        Ok(body.files)
    }

    /// Uploads `local_path` and returns the name the server stored it under.
    ///
    /// `progress` receives one percentage per chunk handed to the transport
    /// and a final 100 once the server has acknowledged the upload.
    pub async fn upload(
        &self,
        local_path: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<String, ClientError> {
        let url = self.url(UPLOAD_ROUTE);
        let mut session = TransferSession::new(
            Direction::Upload,
            local_path.display().to_string(),
            url.clone(),
            self.config.chunk_size,
        );

        let sent = Arc::new(AtomicU64::new(0));
        let result = self
            .send_upload(&url, local_path, progress.clone(), &mut session, &sent)
            .await;
        session.record(sent.load(Ordering::Relaxed));

        match result {
            Ok(filename) => {
                if let Some(cb) = &progress {
                    cb(100);
                }
                session.succeed();
                tracing::info!(
                    source = %session.source(),
                    stored = %filename,
                    bytes = session.transferred_bytes(),
                    elapsed_ms = session.elapsed().as_millis() as u64,
                    "upload complete"
                );
                Ok(filename)
            }
            Err(e) => {
                session.fail(e.to_string());
                tracing::warn!(
                    source = %session.source(),
                    bytes = session.transferred_bytes(),
                    outcome = ?session.outcome(),
                    "upload failed"
                );
                Err(e)
            }
        }
    }

    async fn send_upload(
        &self,
        url: &str,
        local_path: &Path,
        progress: Option<ProgressCallback>,
        session: &mut TransferSession,
        sent: &Arc<AtomicU64>,
    ) -> Result<String, ClientError> {
        let not_found = || ClientError::NotFound(local_path.display().to_string());
        let metadata = tokio::fs::metadata(local_path).await;
        if !metadata.is_ok_and(|m| m.is_file()) {
            return Err(not_found());
        }

        // An existing but unreadable source is reported like a missing one.
        let reader = match ChunkedReader::open(local_path, self.config.chunk_size).await {
            Ok(reader) => reader,
            Err(TransferError::Io(e)) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(not_found());
            }
            Err(e) => return Err(e.into()),
        };
        let total = reader.file_size();
        session.set_total(Some(total));

        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let counter = Arc::clone(sent);
        let mut tracker = ProgressTracker::new(Some(total)).with_callback(progress);
        let stream = reader.into_stream().inspect_ok(move |chunk| {
            counter.fetch_add(chunk.len() as u64, Ordering::Relaxed);
            tracker.advance(chunk.len() as u64);
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file_name)
            .mime_str(UPLOAD_MIME)
            .map_err(ClientError::Http)?;
        let form = Form::new().part(FILE_FIELD, part);

        tracing::debug!(%url, bytes = total, "sending upload");
        let resp = self
            .http
            .post(url)
            .timeout(self.config.upload_timeout)
            .multipart(form)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let body: UploadResponse = resp.json().await?;
        Ok(body.filename)
    }

    /// Downloads the stored file `remote_name` into `local_path`, truncating
    /// it if it exists. Returns the bytes written.
    ///
    /// A missing remote file yields [`ClientError::NotFound`] and leaves
    /// `local_path` untouched.
    pub async fn download(
        &self,
        remote_name: &str,
        local_path: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<u64, ClientError> {
        let url = self.url(&file_route(remote_name));
        let mut session = TransferSession::new(
            Direction::Download,
            url.clone(),
            local_path.display().to_string(),
            self.config.chunk_size,
        );

        match self
            .receive_download(&url, remote_name, local_path, progress, &mut session)
            .await
        {
            Ok(written) => {
                session.record(written);
                session.succeed();
                tracing::info!(
                    remote = %remote_name,
                    destination = %session.destination(),
                    bytes = written,
                    elapsed_ms = session.elapsed().as_millis() as u64,
                    "download complete"
                );
                Ok(written)
            }
            Err(e) => {
                session.fail(e.to_string());
                tracing::warn!(
                    remote = %remote_name,
                    bytes = session.transferred_bytes(),
                    outcome = ?session.outcome(),
                    "download failed"
                );
                Err(e)
            }
        }
    }

    async fn receive_download(
        &self,
        url: &str,
        remote_name: &str,
        local_path: &Path,
        progress: Option<ProgressCallback>,
        session: &mut TransferSession,
    ) -> Result<u64, ClientError> {
        let resp = self
            .http
            .get(url)
            .timeout(self.config.download_timeout)
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(remote_name.to_string()));
        }
        let resp = check_status(resp).await?;

        let mut tracker = ProgressTracker::new(resp.content_length()).with_callback(progress);
        session.set_total(tracker.total());
        let body = StreamReader::new(resp.bytes_stream().map_err(io::Error::other));
        let written = ChunkedWriter::new(self.config.chunk_size)
            .write_with_progress(local_path, body, |so_far| {
                session.record(so_far);
                tracker.update(so_far);
            })
            .await?;
        tracker.finish();
        Ok(written)
    }
}

/// Passes successful responses through; turns the rest into
/// [`ClientError::Server`].
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.unwrap_or_default();
    Err(ClientError::server(status.as_u16(), &body))
}
