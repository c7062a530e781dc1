//! Command execution.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use lanshare_client::{ClientError, TransferClient, TransferEvent, TransferWorker};
use lanshare_server::FileServer;

use crate::Command;
use crate::backend::BackendManager;
use crate::config::Config;
use crate::progress::{TransferProgress, format_bytes};

/// How long a spawned backend gets to answer its liveness route.
const BACKEND_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Executes `command`. `config_path` is the `--config` file, if any, and is
/// handed on to a spawned backend.
pub async fn run(
    command: Command,
    config: Config,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let backend = BackendSettings {
        config: &config,
        config_path: config_path.as_deref(),
    };
    match command {
        Command::Serve { .. } => serve(&config).await,
        Command::Status => status(&config).await,
        Command::Upload { file, spawn_server } => {
            with_backend(backend, spawn_server, |client| upload(client, file)).await
        }
        Command::Download {
            name,
            output,
            spawn_server,
        } => {
            let output = output.unwrap_or_else(|| PathBuf::from(&name));
            with_backend(backend, spawn_server, |client| download(client, name, output)).await
        }
        Command::List { spawn_server } => with_backend(backend, spawn_server, list).await,
    }
}

/// Runs the file server until Ctrl-C.
async fn serve(config: &Config) -> anyhow::Result<()> {
    let server = FileServer::new(config.server_config());
    let runner = Arc::clone(&server);
    let mut task = tokio::spawn(async move { runner.run().await });

    tokio::select! {
        result = &mut task => {
            result??;
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
            server.shutdown();
        }
    }

    task.await??;
    Ok(())
}

async fn status(config: &Config) -> anyhow::Result<()> {
    let client = TransferClient::new(config.client_config())?;
    let url = &client.config().base_url;
    let status = client
        .health()
        .await
        .with_context(|| format!("no server at {url}"))?;
    println!("{url}: {status}");
    Ok(())
}

/// Settings a spawned backend inherits from this invocation.
#[derive(Clone, Copy)]
struct BackendSettings<'a> {
    config: &'a Config,
    config_path: Option<&'a Path>,
}

/// Runs `op` with a client, optionally inside the lifetime of a spawned
/// backend. The backend is stopped whether or not `op` succeeds.
async fn with_backend<F, Fut>(
    settings: BackendSettings<'_>,
    spawn_server: bool,
    op: F,
) -> anyhow::Result<()>
where
    F: FnOnce(TransferClient) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let client = TransferClient::new(settings.config.client_config())?;
    if !spawn_server {
        return op(client).await;
    }

    let mut backend =
        BackendManager::new(settings.config, settings.config_path.map(Path::to_path_buf))?;
    backend.start()?;
    let result = match backend.wait_ready(&client, BACKEND_READY_TIMEOUT).await {
        Ok(()) => op(client).await,
        Err(e) => Err(e),
    };
    backend.stop().await?;
    result
}

async fn upload(client: TransferClient, file: PathBuf) -> anyhow::Result<()> {
    let label = format!("Uploading {}", file.display());
    let mut worker = TransferWorker::new(client);
    let events = worker.take_events().context("event channel already taken")?;
    let cancel = worker.cancel_token();
    let spawned = worker.spawn_upload(file);

    let stored = drive(&label, events, spawned.handle, cancel).await?;
    println!("{stored}");
    Ok(())
}

async fn download(client: TransferClient, name: String, output: PathBuf) -> anyhow::Result<()> {
    let label = format!("Downloading {name}");
    let mut worker = TransferWorker::new(client);
    let events = worker.take_events().context("event channel already taken")?;
    let cancel = worker.cancel_token();
    let spawned = worker.spawn_download(name, output.clone());

    let bytes = drive(&label, events, spawned.handle, cancel).await?;
    println!("{} ({})", output.display(), format_bytes(bytes));
    Ok(())
}

async fn list(client: TransferClient) -> anyhow::Result<()> {
    let files = client.list_files().await?;
    if files.is_empty() {
        println!("no files stored");
        return Ok(());
    }

    let width = files.iter().map(|f| f.filename.len()).max().unwrap_or(0);
    for file in files {
        println!(
            "{:<width$}  {:>10}  {}",
            file.filename,
            format_bytes(file.size),
            file.content_type
        );
    }
    Ok(())
}

/// Renders worker events on a progress bar until the transfer ends, then
/// returns the transfer's result. Ctrl-C cancels the transfer.
async fn drive<T>(
    label: &str,
    mut events: mpsc::Receiver<TransferEvent>,
    handle: JoinHandle<Result<T, ClientError>>,
    cancel: CancellationToken,
) -> anyhow::Result<T> {
    let progress = TransferProgress::new(label);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(TransferEvent::Progress { percent, .. }) => progress.set_percentage(percent),
                Some(TransferEvent::Completed { detail, .. }) => {
                    progress.finish(format!("Done: {detail}"));
                    break;
                }
                Some(TransferEvent::Failed { reason, .. }) => {
                    progress.abandon(format!("Failed: {reason}"));
                    break;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                tracing::info!("interrupt received, cancelling transfer");
                cancel.cancel();
            }
        }
    }

    Ok(handle.await??)
}
