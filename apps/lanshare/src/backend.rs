//! Supervises a LanShare server running as a child process.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use tokio::process::{Child, Command};

use lanshare_client::TransferClient;

use crate::config::Config;

/// Delay between liveness checks in [`BackendManager::wait_ready`].
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Starts and stops a `lanshare serve` child process.
pub struct BackendManager {
    program: PathBuf,
    host: String,
    port: u16,
    storage_dir: PathBuf,
    chunk_size: usize,
    config_path: Option<PathBuf>,
    child: Option<Child>,
}

impl BackendManager {
    /// Manager that re-runs the current executable in `serve` mode with the
    /// effective settings of `config`. `config_path` is forwarded so the child
    /// reads the same file as the parent.
    pub fn new(config: &Config, config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let program = std::env::current_exe().context("locating current executable")?;
        Ok(Self {
            program,
            host: config.host.clone(),
            port: config.port,
            storage_dir: config.storage_dir.clone(),
            chunk_size: config.chunk_size,
            config_path,
            child: None,
        })
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--host".into(),
            self.host.clone().into(),
            "--port".into(),
            self.port.to_string().into(),
            "--chunk-size".into(),
            self.chunk_size.to_string().into(),
            "serve".into(),
            "--storage-dir".into(),
            self.storage_dir.clone().into_os_string(),
        ];
        if let Some(path) = &self.config_path {
            args.insert(0, path.clone().into_os_string());
            args.insert(0, "--config".into());
        }
        args
    }

    /// Spawns the server. A second call while running only logs a warning.
    pub fn start(&mut self) -> anyhow::Result<()> {
        if self.is_running() {
            tracing::warn!("backend already running");
            return Ok(());
        }

        tracing::info!(host = %self.host, port = self.port, "starting backend server");
        let child = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning {}", self.program.display()))?;
        self.child = Some(child);
        Ok(())
    }

    /// Polls the liveness route until the server answers or `timeout` passes.
    ///
    /// Fails early if the child process exits.
    pub async fn wait_ready(
        &mut self,
        client: &TransferClient,
        timeout: Duration,
    ) -> anyhow::Result<()> {
        let started = Instant::now();
        loop {
            match client.health().await {
                Ok(status) => {
                    tracing::debug!(%status, "backend ready");
                    return Ok(());
                }
                Err(e) => tracing::debug!("backend not ready yet: {e}"),
            }

            if let Some(child) = self.child.as_mut() {
                if let Some(status) = child.try_wait()? {
                    self.child = None;
                    bail!("backend exited before becoming ready: {status}");
                }
            }

            if started.elapsed() >= timeout {
                bail!("backend not ready after {}s", timeout.as_secs_f32());
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Kills the child and waits for it to exit. No-op when not running.
    pub async fn stop(&mut self) -> anyhow::Result<()> {
        if let Some(mut child) = self.child.take() {
            tracing::info!("stopping backend server");
            child.kill().await.context("stopping backend")?;
        }
        Ok(())
    }
}
