//! Chunked file transfer core.
//!
//! Everything that touches file bytes on either side of the HTTP boundary
//! lives here: storage-name generation, bounded-memory chunked reading and
//! writing, and percentage progress accounting.

mod chunked;
mod content_type;
mod progress;
mod sanitize;
mod types;
mod validation;

pub use chunked::{ChunkedReader, ChunkedWriter};
pub use content_type::{DEFAULT_CONTENT_TYPE, detect_content_type};
pub use progress::{ProgressCallback, ProgressTracker, percentage};
pub use sanitize::{TIMESTAMP_FORMAT, sanitize, sanitize_at, split_extension};
pub use types::{Direction, TransferOutcome, TransferSession};
pub use validation::validate_stored_name;

/// Default chunk size: 1 MiB.
///
/// Peak memory per transfer is bounded by one chunk buffer.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid name: {0}")]
    InvalidName(String),
}

impl TransferError {
    /// Returns `true` for the not-found case, whether reported directly or as
    /// an I/O error of kind [`std::io::ErrorKind::NotFound`].
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Self::InvalidName(_) => false,
        }
    }
}
