//! LanShare configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/lanshare/config.toml`
//! - Windows: `%APPDATA%/lanshare/config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use lanshare_client::ClientConfig;
use lanshare_protocol::DEFAULT_PORT;
use lanshare_server::{DEFAULT_STORAGE_DIR, ServerConfig};
use lanshare_transfer::DEFAULT_CHUNK_SIZE;

/// App configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Server bind host, and the host clients connect to.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory the server stores files in.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Chunk size in bytes for reads and writes on both sides.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_secs: u64,

    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_DIR)
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_upload_timeout() -> u64 {
    60
}

fn default_download_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            storage_dir: default_storage_dir(),
            chunk_size: default_chunk_size(),
            upload_timeout_secs: default_upload_timeout(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

impl Config {
    /// Loads configuration from the default location, creating it if absent.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads configuration from `path`, writing a default file there if
    /// it does not exist yet.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Writes the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            storage_dir: self.storage_dir.clone(),
            chunk_size: self.chunk_size,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            upload_timeout: Duration::from_secs(self.upload_timeout_secs),
            download_timeout: Duration::from_secs(self.download_timeout_secs),
            chunk_size: self.chunk_size,
            ..ClientConfig::for_server(&self.host, self.port)
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("lanshare").join("config.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("lanshare")
            .join("config.toml"))
    }
}
