use serde::{Deserialize, Serialize};

use crate::constants::{STATUS_ERROR, STATUS_RUNNING, STATUS_SUCCESS};

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Body of a successful `POST /upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    /// Sanitized name the file was stored under.
    pub filename: String,
}

impl UploadResponse {
    pub fn success(filename: impl Into<String>) -> Self {
        Self {
            status: STATUS_SUCCESS.into(),
            filename: filename.into(),
        }
    }
}

/// Body of any failed request.
///
/// Upload failures carry `status: "error"`; not-found answers only carry
/// `detail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub detail: String,
}

impl ErrorResponse {
    /// `{"status": "error", "detail": ...}`.
    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            status: Some(STATUS_ERROR.into()),
            detail: detail.into(),
        }
    }

    /// `{"detail": ...}`.
    pub fn detail(detail: impl Into<String>) -> Self {
        Self {
            status: None,
            detail: detail.into(),
        }
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: STATUS_RUNNING.into(),
        }
    }
}

/// One stored file in a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    pub size: u64,
    pub content_type: String,
}

/// Body of `GET /files`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<FileEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_success_json_shape() {
        let resp = UploadResponse::success("a_20240301_101530123.txt");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            json,
            r#"{"status":"success","filename":"a_20240301_101530123.txt"}"#
        );
    }

    #[test]
    fn error_json_shape() {
        let json = serde_json::to_string(&ErrorResponse::error("disk full")).unwrap();
        assert_eq!(json, r#"{"status":"error","detail":"disk full"}"#);
    }

    #[test]
    fn detail_only_omits_status() {
        let json = serde_json::to_string(&ErrorResponse::detail("File not found")).unwrap();
        assert_eq!(json, r#"{"detail":"File not found"}"#);
    }

    #[test]
    fn error_parses_without_status() {
        let parsed: ErrorResponse = serde_json::from_str(r#"{"detail":"nope"}"#).unwrap();
        assert_eq!(parsed.status, None);
        assert_eq!(parsed.detail, "nope");
    }

    #[test]
    fn health_default_status() {
        let json = serde_json::to_string(&HealthResponse::default()).unwrap();
        assert_eq!(json, r#"{"status":"backend running"}"#);
    }

    #[test]
    fn file_list_parses() {
        let json = r#"{"files":[{"filename":"a.txt","size":3,"content_type":"text/plain"}]}"#;
        let parsed: FileListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.files.len(), 1);
        assert_eq!(parsed.files[0].size, 3);
    }
}
