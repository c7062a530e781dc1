use std::fmt;
use std::time::{Duration, Instant};

/// Which way the bytes flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("upload"),
            Self::Download => f.write_str("download"),
        }
    }
}

/// Terminal state of a transfer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Success,
    Failed(String),
}

/// State of a single upload or download call.
///
/// Owned by the operation that runs the transfer and dropped when it
/// returns; it is never shared between tasks.
#[derive(Debug)]
pub struct TransferSession {
    direction: Direction,
    source: String,
    destination: String,
    chunk_size: usize,
    total_bytes: Option<u64>,
    transferred_bytes: u64,
    started_at: Instant,
    outcome: Option<TransferOutcome>,
}

impl TransferSession {
    /// Starts a session.
    pub fn new(
        direction: Direction,
        source: impl Into<String>,
        destination: impl Into<String>,
        chunk_size: usize,
    ) -> Self {
        Self {
            direction,
            source: source.into(),
            destination: destination.into(),
            chunk_size,
            total_bytes: None,
            transferred_bytes: 0,
            started_at: Instant::now(),
            outcome: None,
        }
    }

    /// Sets the total size once it becomes known (file metadata or
    /// response headers).
    pub fn set_total(&mut self, total: Option<u64>) {
        self.total_bytes = total;
    }

    /// Records the running byte count. Smaller values than already recorded
    /// are ignored.
    pub fn record(&mut self, bytes_so_far: u64) {
        self.transferred_bytes = self.transferred_bytes.max(bytes_so_far);
    }

    /// Marks the session successful.
    ///
    /// A known total that differs from the recorded byte count is logged.
    pub fn succeed(&mut self) {
        if let Some(total) = self.total_bytes {
            if total != self.transferred_bytes {
                tracing::warn!(
                    direction = %self.direction,
                    total,
                    transferred = self.transferred_bytes,
                    "transfer finished with unexpected byte count"
                );
            }
        }
        self.outcome = Some(TransferOutcome::Success);
    }

    /// Marks the session failed.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.outcome = Some(TransferOutcome::Failed(reason.into()));
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }

    /// Terminal outcome, `None` while running.
    pub fn outcome(&self) -> Option<&TransferOutcome> {
        self.outcome.as_ref()
    }

    /// Time since the session started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
