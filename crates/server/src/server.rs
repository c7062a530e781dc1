//! File server lifecycle.
//!
//! Binds a TCP listener, serves the [`router`](crate::routes::router) until
//! [`FileServer::shutdown`] is called, then drains in-flight requests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use lanshare_protocol::DEFAULT_PORT;
use lanshare_transfer::DEFAULT_CHUNK_SIZE;

use crate::ServerError;
use crate::routes;
use crate::storage::Storage;

/// Default storage directory, relative to the working directory.
pub const DEFAULT_STORAGE_DIR: &str = "shared";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// Directory uploads are written to and downloads are served from.
    pub storage_dir: PathBuf,
    /// Read/write chunk size in bytes.
    pub chunk_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: DEFAULT_PORT,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// The HTTP file server.
pub struct FileServer {
    host: String,
    port: u16,
    storage: Storage,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl FileServer {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Arc::new(Self {
            host: config.host,
            port: config.port,
            storage: Storage::new(config.storage_dir, config.chunk_size),
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Gracefully shuts down the server.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until cancellation.
    ///
    /// Creates the storage directory before binding.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        self.storage.ensure_dir().await?;

        let listener = TcpListener::bind((self.host.as_str(), self.port)).await?;
        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!(
            storage = %self.storage.dir().display(),
            "file server listening on {local_addr}"
        );

        let app = routes::router(self.storage.clone());
        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.clone().cancelled_owned())
            .await?;

        tracing::info!("server shut down");
        Ok(())
    }
}
