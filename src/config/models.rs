use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Public base URL embedded in shared clip links
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            public_base_url: default_public_base_url(),
            downloads_dir: default_downloads_dir(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_downloads_dir() -> PathBuf {
    PathBuf::from("downloads")
}

/// Fetch operation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Upper bound on one job end to end; a hung fetch becomes a failed job
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
    #[serde(default = "default_max_clip_bytes")]
    pub max_clip_bytes: ByteSize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            job_timeout_secs: default_job_timeout_secs(),
            max_clip_bytes: default_max_clip_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_job_timeout_secs() -> u64 {
    300
}

fn default_max_clip_bytes() -> ByteSize {
    ByteSize(2 * 1024 * 1024 * 1024) // 2 GB
}

fn default_user_agent() -> String {
    format!("clipshare/{}", env!("CARGO_PKG_VERSION"))
}

/// Chat gateway configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Bot credential (loaded from environment, not from config file)
    #[serde(skip)]
    pub bot_token: Option<String>,
}
