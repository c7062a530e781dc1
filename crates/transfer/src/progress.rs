use std::sync::Arc;

/// Callback invoked with a transfer percentage (0–100).
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Computes `floor(bytes_so_far * 100 / total)` clamped to 100.
///
/// Returns `None` when the total is unknown or zero.
pub fn percentage(bytes_so_far: u64, total: Option<u64>) -> Option<u8> {
    match total {
        Some(total) if total > 0 => {
            let pct = (u128::from(bytes_so_far) * 100 / u128::from(total)).min(100);
            Some(pct as u8)
        }
        _ => None,
    }
}

/// Per-session percentage accounting.
///
/// Fed once per chunk with the running byte count. With a known total every
/// chunk produces one notification; with an unknown total nothing is emitted
/// until [`finish`](Self::finish) reports 100.
pub struct ProgressTracker {
    total: Option<u64>,
    transferred: u64,
    last: Option<u8>,
    finished: bool,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    /// Creates a tracker for a session of `total` bytes (`None` = unknown).
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            transferred: 0,
            last: None,
            finished: false,
            callback: None,
        }
    }

    /// Attaches the notification callback.
    pub fn with_callback(mut self, callback: Option<ProgressCallback>) -> Self {
        self.callback = callback;
        self
    }

    /// Records the running byte count after a chunk and returns the
    /// percentage, if one can be computed.
    ///
    /// Never goes backwards: a smaller count than a previous one is ignored.
    pub fn update(&mut self, bytes_so_far: u64) -> Option<u8> {
        self.transferred = self.transferred.max(bytes_so_far);

        let pct = percentage(self.transferred, self.total)?;
        let pct = self.last.map_or(pct, |last| last.max(pct));
        self.last = Some(pct);
        self.notify(pct);
        Some(pct)
    }

    /// Records one more chunk of `chunk_len` bytes.
    pub fn advance(&mut self, chunk_len: u64) -> Option<u8> {
        self.update(self.transferred.saturating_add(chunk_len))
    }

    /// Emits the terminal 100% notification. Later calls are no-ops.
    pub fn finish(&mut self) -> u8 {
        if !self.finished {
            self.finished = true;
            self.last = Some(100);
            self.notify(100);
        }
        100
    }

    fn notify(&self, pct: u8) {
        if let Some(cb) = &self.callback {
            cb(pct);
        }
    }

    /// Session total, if known and non-zero.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Bytes recorded so far.
    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    /// Last reported percentage.
    #[cfg(test)]
    pub(crate) fn last_percentage(&self) -> Option<u8> {
        self.last
    }
}
