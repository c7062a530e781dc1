//! HTTP file server for LanShare.
//!
//! Accepts multipart uploads into a flat storage directory under sanitized,
//! timestamped names and streams stored files back in chunks.

mod routes;
mod server;
mod storage;

pub use routes::{ApiError, router};
pub use server::{DEFAULT_STORAGE_DIR, FileServer, ServerConfig};
pub use storage::{Storage, StoredFile};

/// Errors produced by the file server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
