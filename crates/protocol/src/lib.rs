//! HTTP wire types for LanShare server/client communication.
//!
//! JSON shapes: `{"status": ..., "filename": ...}` on upload,
//! `{"status": "error", "detail": ...}` on failure, `{"detail": ...}` for
//! not-found.

pub mod constants;
pub mod messages;

// Re-export primary types for convenience.
pub use constants::{
    DEFAULT_PORT, FILE_FIELD, FILES_ROUTE, HEALTH_ROUTE, STATUS_ERROR, STATUS_RUNNING,
    STATUS_SUCCESS, UPLOAD_ROUTE, encode_path_segment, file_route,
};
pub use messages::{ErrorResponse, FileEntry, FileListResponse, HealthResponse, UploadResponse};
