//! Daemon configuration.
//!
//! Read from a TOML file whose path comes from `--config` or
//! `RANGEDROP_CONFIG`. Every field is optional; missing ones take the
//! defaults below.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use rangedrop_protocol::constants::DEFAULT_CHUNK_SIZE;
use rangedrop_server::{DEFAULT_MAX_REQUEST_BYTES, ServerConfig};
use serde::{Deserialize, Serialize};

/// Daemon configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listen address.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Root of `sessions/` and `files/`.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Chunk size advertised to clients, in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: u64,

    /// Bearer token lifetime in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// HMAC key for bearer tokens. When unset a random key is generated at
    /// startup and tokens stop verifying after a restart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,

    /// Seconds between cleanup sweeps.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    /// Idle seconds after which an upload is reclaimed.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Origin allowed by CORS.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,
}

fn default_listen_addr() -> SocketAddr {
    ([0, 0, 0, 0], 8080).into()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

fn default_max_request_bytes() -> u64 {
    DEFAULT_MAX_REQUEST_BYTES
}

fn default_token_ttl_secs() -> u64 {
    30 * 60
}

fn default_cleanup_interval_secs() -> u64 {
    60 * 60
}

fn default_retention_secs() -> u64 {
    24 * 60 * 60
}

fn default_allowed_origin() -> String {
    "http://localhost:3000".into()
}

fn default_username() -> String {
    "admin".into()
}

fn default_password() -> String {
    "admin".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            upload_dir: default_upload_dir(),
            chunk_size: default_chunk_size(),
            max_request_bytes: default_max_request_bytes(),
            token_ttl_secs: default_token_ttl_secs(),
            token_secret: None,
            cleanup_interval_secs: default_cleanup_interval_secs(),
            retention_secs: default_retention_secs(),
            allowed_origin: default_allowed_origin(),
            username: default_username(),
            password: default_password(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or defaults if there is no file.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config: Config = match path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            Some(path) => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                Config::default()
            }
            None => Config::default(),
        };

        config.validate()?;
        if config.password == default_password() {
            tracing::warn!("using the default password; set `password` in the config file");
        }
        Ok(config)
    }

    /// Rejects values the service cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let positive = [
            ("chunk_size", self.chunk_size),
            ("max_request_bytes", self.max_request_bytes),
            ("token_ttl_secs", self.token_ttl_secs),
            ("cleanup_interval_secs", self.cleanup_interval_secs),
            ("retention_secs", self.retention_secs),
        ];
        for (name, value) in positive {
            if value == 0 {
                bail!("{name} must be positive");
            }
        }
        if self.chunk_size > self.max_request_bytes {
            bail!("chunk_size must not exceed max_request_bytes");
        }
        if self.username.is_empty() {
            bail!("username must not be empty");
        }
        if self.allowed_origin.is_empty() {
            bail!("allowed_origin must not be empty");
        }
        if self.token_secret.as_deref().is_some_and(str::is_empty) {
            bail!("token_secret must not be empty when set");
        }
        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            listen_addr: self.listen_addr,
            chunk_size: self.chunk_size,
            max_request_bytes: self.max_request_bytes,
            allowed_origin: self.allowed_origin.clone(),
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}
