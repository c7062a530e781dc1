use lanshare_protocol::ErrorResponse;
use lanshare_transfer::TransferError;

/// Errors from the transfer client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Local source missing (upload) or remote file missing (download).
    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server could not be reached: refused, timed out, unresolved.
    #[error("connection failed: {0}")]
    Connectivity(String),

    #[error("server error {status}: {detail}")]
    Server { status: u16, detail: String },

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transfer cancelled")]
    Cancelled,
}

impl ClientError {
    /// Builds a [`ClientError::Server`] from a status code and a raw response
    /// body, preferring the body's `detail` field when it parses.
    pub(crate) fn server(status: u16, body: &[u8]) -> Self {
        let detail = match serde_json::from_slice::<ErrorResponse>(body) {
            Ok(resp) => resp.detail,
            Err(_) => String::from_utf8_lossy(body).trim().to_string(),
        };
        Self::Server { status, detail }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::Connectivity(e.to_string())
        } else {
            Self::Http(e)
        }
    }
}

impl From<TransferError> for ClientError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::Io(e) => Self::Io(e),
            TransferError::NotFound(what) => Self::NotFound(what),
            TransferError::InvalidName(name) => Self::NotFound(name),
        }
    }
}
