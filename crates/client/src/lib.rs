//! Client side of LanShare.
//!
//! [`TransferClient`] performs single uploads, downloads, listings and
//! liveness checks against a LanShare server. [`TransferWorker`] runs those
//! transfers as background tasks that report over an event channel.

mod client;
mod error;
mod worker;

pub use client::{ClientConfig, TransferClient};
pub use error::ClientError;
pub use worker::{EVENT_BUFFER_SIZE, SpawnedTransfer, TransferEvent, TransferId, TransferWorker};

pub use lanshare_protocol::FileEntry;
pub use lanshare_transfer::ProgressCallback;
