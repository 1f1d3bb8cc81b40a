use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::ConfigError;

pub const DEFAULT_RPC_ENDPOINT: &str = "http://127.0.0.1:8899";

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_ip: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.listen_ip.as_deref().unwrap_or("127.0.0.1");
        let port = self.port.unwrap_or(3000);
        let addr_str = format!("{}:{}", ip, port);
        addr_str
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(addr_str))
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RpcConfig {
    pub endpoint: String,
    pub user_agent: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RPC_ENDPOINT.to_string(),
            user_agent: "zeno-explorer/0.1".to_string(),
        }
    }
}

impl RpcConfig {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }
}

/// Refresh periods for the background pollers, in seconds.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PollConfig {
    pub chain_secs: u64,
    pub activity_secs: u64,
    pub validators_secs: u64,
    pub price_secs: u64,
    pub recent_limit: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            chain_secs: 10,
            activity_secs: 5,
            validators_secs: 30,
            price_secs: 10,
            recent_limit: 10,
        }
    }
}

impl PollConfig {
    pub fn chain_period(&self) -> Duration {
        Duration::from_secs(self.chain_secs.max(1))
    }

    pub fn activity_period(&self) -> Duration {
        Duration::from_secs(self.activity_secs.max(1))
    }

    pub fn validators_period(&self) -> Duration {
        Duration::from_secs(self.validators_secs.max(1))
    }

    pub fn price_period(&self) -> Duration {
        Duration::from_secs(self.price_secs.max(1))
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub rpc: RpcConfig,
    pub poll: PollConfig,
}

pub fn parse_config(config_str: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(config_str)?)
}

/// Loads the TOML config at `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(config_str) => parse_config(&config_str),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No config file at {}, using defaults", path.display());
            Ok(AppConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}
