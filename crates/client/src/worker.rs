//! Background transfer workers.
//!
//! Each transfer runs as its own tokio task and reports through an `mpsc`
//! event channel, so a host (CLI, UI) can render progress from its own loop
//! without sharing state with the transfer. Every event carries the
//! [`TransferId`] of the transfer it belongs to, so one worker can drive
//! several transfers at once.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use lanshare_transfer::ProgressCallback;

use crate::{ClientError, TransferClient};

/// Event channel capacity.
///
/// Progress events are sent with `try_send`; a full channel drops
/// intermediate percentages but never terminal events.
pub const EVENT_BUFFER_SIZE: usize = 256;

/// Identifies a transfer spawned by a [`TransferWorker`]. Unique per worker.
pub type TransferId = u64;

/// Event emitted by a running transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// Percentage complete, 0 to 100.
    Progress { id: TransferId, percent: u8 },
    /// Transfer finished. `detail` is the stored name for uploads and the
    /// local destination for downloads.
    Completed { id: TransferId, detail: String },
    /// Transfer failed or was cancelled.
    Failed { id: TransferId, reason: String },
}

impl TransferEvent {
    /// Transfer this event belongs to.
    pub fn id(&self) -> TransferId {
        match self {
            Self::Progress { id, .. } | Self::Completed { id, .. } | Self::Failed { id, .. } => *id,
        }
    }

    /// Returns `true` for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// A spawned transfer: its event id and the task resolving to its result.
pub struct SpawnedTransfer<T> {
    pub id: TransferId,
    pub handle: JoinHandle<Result<T, ClientError>>,
}

/// Spawns transfers on the tokio runtime and funnels their events into one
/// channel.
pub struct TransferWorker {
    client: Arc<TransferClient>,
    events_tx: mpsc::Sender<TransferEvent>,
    events_rx: Option<mpsc::Receiver<TransferEvent>>,
    cancel: CancellationToken,
    next_id: AtomicU64,
}

impl TransferWorker {
    pub fn new(client: TransferClient) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER_SIZE);
        Self {
            client: Arc::new(client),
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<TransferEvent>> {
        self.events_rx.take()
    }

    /// Returns the token that cancels every transfer spawned by this worker.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn allocate_id(&self) -> TransferId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn progress_callback(&self, id: TransferId) -> ProgressCallback {
        let tx = self.events_tx.clone();
        Arc::new(move |percent| {
            let _ = tx.try_send(TransferEvent::Progress { id, percent });
        })
    }

    /// Uploads `path` in the background. Resolves to the stored name.
    pub fn spawn_upload(&self, path: PathBuf) -> SpawnedTransfer<String> {
        let id = self.allocate_id();
        let client = Arc::clone(&self.client);
        let events = self.events_tx.clone();
        let cancel = self.cancel.clone();
        let progress = self.progress_callback(id);

        let handle = tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ClientError::Cancelled),
                r = client.upload(&path, Some(progress)) => r,
            };
            report(&events, id, "upload", result, |name| name.clone()).await
        });
        SpawnedTransfer { id, handle }
    }

    /// Downloads `remote_name` into `destination` in the background.
    /// Resolves to the bytes written.
    pub fn spawn_download(
        &self,
        remote_name: String,
        destination: PathBuf,
    ) -> SpawnedTransfer<u64> {
        let id = self.allocate_id();
        let client = Arc::clone(&self.client);
        let events = self.events_tx.clone();
        let cancel = self.cancel.clone();
        let progress = self.progress_callback(id);

        let handle = tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ClientError::Cancelled),
                r = client.download(&remote_name, &destination, Some(progress)) => r,
            };
            let dest = destination.display().to_string();
            report(&events, id, "download", result, move |_| dest).await
        });
        SpawnedTransfer { id, handle }
    }
}

/// Emits the terminal event for `result` and hands it back.
async fn report<T>(
    events: &mpsc::Sender<TransferEvent>,
    id: TransferId,
    kind: &str,
    result: Result<T, ClientError>,
    describe: impl FnOnce(&T) -> String,
) -> Result<T, ClientError> {
    let event = match &result {
        Ok(value) => {
            let detail = describe(value);
            info!(id, %kind, %detail, "transfer completed");
            TransferEvent::Completed { id, detail }
        }
        Err(e) => {
            error!(id, %kind, error = %e, "transfer failed");
            TransferEvent::Failed {
                id,
                reason: e.to_string(),
            }
        }
    };
    let _ = events.send(event).await;
    result
}
