#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Harness Configuration
//!
//! This crate provides configuration management for the regtest harness.
//! It handles loading, saving, and overriding configuration that specifies:
//! - How to reach the Bitcoin Core node (endpoint, credentials, wallet)
//! - Logging configuration
//!
//! Configuration is stored in TOML format. Every field has a default suited
//! to a local regtest node, so a partial file (or none at all) is valid.
//! Environment variables override file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bitcoin::Network;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wallet file name used when none is configured.
pub const DEFAULT_WALLET: &str = "main.dat";
/// Default RPC username.
pub const DEFAULT_RPC_USER: &str = "user";
/// Default RPC password.
pub const DEFAULT_RPC_PASSWORD: &str = "password";
/// Default RPC host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default regtest RPC port.
pub const DEFAULT_PORT: u16 = 18443;
/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur when loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    /// Failed to parse the TOML configuration file
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize configuration to TOML format
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Configuration file was not found at the specified path
    #[error("Config file not found at: {0}")]
    NotFound(PathBuf),
    /// Could not locate the user's configuration directory
    #[error("Could not find user config directory")]
    ConfigDirUnavailable,
    /// The network name is not one Bitcoin Core knows
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
    /// The endpoint override could not be parsed
    #[error("Invalid RPC uri '{uri}': {reason}")]
    InvalidUri {
        /// The rejected uri.
        uri: String,
        /// Why it was rejected.
        reason: String,
    },
    /// An environment override held an unusable value
    #[error("Invalid value '{value}' for {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Node connection settings
    pub node: NodeConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// How to reach the node and which wallet to drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Network label (regtest, testnet, signet, mainnet, testnet4)
    pub network: String,
    /// Full endpoint override; wins over the derived endpoint when set
    pub uri: Option<String>,
    /// Wallet file name
    pub wallet: String,
    /// RPC username
    pub rpc_user: String,
    /// RPC password
    pub rpc_password: String,
    /// RPC host
    pub host: String,
    /// RPC port
    pub port: u16,
    /// Bitcoin Core `.cookie` file; replaces `rpc_user`/`rpc_password` when set
    pub cookie_file: Option<PathBuf>,
    /// Per-request timeout in seconds; `0` disables it
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (debug, info, warn, error, ...)
    pub level: String,
}

/// RPC credentials sent as HTTP basic auth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username
    pub user: String,
    /// Password
    pub password: String,
}

/// The resolved location of the node's wallet RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// URL scheme, normally `http`
    pub scheme: String,
    /// Host name or address
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Request path, `/wallet/<name>` for derived endpoints
    pub path: String,
    /// Basic-auth credentials, if any
    pub credentials: Option<Credentials>,
}

impl Endpoint {
    /// Parse an explicit endpoint uri. Credentials embedded in the uri are
    /// lifted out into [`Endpoint::credentials`].
    pub fn parse(uri: &str) -> Result<Self, ConfigError> {
        let invalid =
            |reason: String| ConfigError::InvalidUri { uri: uri.to_string(), reason };

        let parsed = url::Url::parse(uri).map_err(|e| invalid(e.to_string()))?;
        let host = parsed.host_str().ok_or_else(|| invalid("missing host".to_string()))?;
        let port =
            parsed.port_or_known_default().ok_or_else(|| invalid("missing port".to_string()))?;

        let credentials = if parsed.username().is_empty() {
            None
        } else {
            Some(Credentials {
                user: parsed.username().to_string(),
                password: parsed.password().unwrap_or_default().to_string(),
            })
        };

        Ok(Self {
            scheme: parsed.scheme().to_string(),
            host: host.to_string(),
            port,
            path: parsed.path().to_string(),
            credentials,
        })
    }

    /// The endpoint URL without credentials.
    pub fn url(&self) -> String { format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path) }

    /// The wallet named by a `/wallet/<name>` path, if any.
    pub fn wallet(&self) -> Option<&str> {
        self.path
            .strip_prefix("/wallet/")
            .map(|name| name.trim_end_matches('/'))
            .filter(|name| !name.is_empty() && !name.contains('/'))
    }
}

/// Paths that address the node rather than a wallet.
fn is_node_root(path: &str) -> bool { matches!(path, "" | "/" | "/wallet" | "/wallet/") }

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.credentials {
            Some(c) => write!(f, "{}://{}:***@{}:{}{}", self.scheme, c.user, self.host, self.port, self.path),
            None => f.write_str(&self.url()),
        }
    }
}

impl NodeConfig {
    /// Resolve the endpoint.
    ///
    /// An explicit `uri` wins; the derived
    /// `http://<host>:<port>/wallet/<wallet>` applies only when `uri` is
    /// absent. An override without embedded credentials inherits
    /// `rpc_user`/`rpc_password`, and one that stops at the node root
    /// (`/` or `/wallet/`) gets `/wallet/<wallet>` appended.
    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        let default_credentials =
            Credentials { user: self.rpc_user.clone(), password: self.rpc_password.clone() };

        match &self.uri {
            Some(uri) => {
                let mut endpoint = Endpoint::parse(uri)?;
                endpoint.credentials.get_or_insert(default_credentials);
                if is_node_root(&endpoint.path) {
                    endpoint.path = format!("/wallet/{}", self.wallet);
                }
                Ok(endpoint)
            }
            None => Ok(Endpoint {
                scheme: "http".to_string(),
                host: self.host.clone(),
                port: self.port,
                path: format!("/wallet/{}", self.wallet),
                credentials: Some(default_credentials),
            }),
        }
    }

    /// A copy of this configuration bound to another wallet.
    ///
    /// A `uri` whose path names a wallet (or the node root) is rewritten to
    /// `/wallet/<wallet>`; any other path is left alone.
    pub fn for_wallet(&self, wallet: &str) -> Result<Self, ConfigError> {
        let mut node = self.clone();
        node.wallet = wallet.to_string();

        if let Some(uri) = &self.uri {
            let mut parsed = url::Url::parse(uri)
                .map_err(|e| ConfigError::InvalidUri { uri: uri.clone(), reason: e.to_string() })?;
            if is_node_root(parsed.path()) || parsed.path().starts_with("/wallet/") {
                parsed.set_path(&format!("/wallet/{}", wallet));
                node.uri = Some(parsed.to_string());
            }
        }
        Ok(node)
    }

    /// Parse the network label.
    pub fn network(&self) -> Result<Network, ConfigError> {
        network_from_str(&self.network).ok_or_else(|| ConfigError::UnknownNetwork(self.network.clone()))
    }

    /// Per-request timeout, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Override fields from the process environment:
    /// - `RPC_URI`: overrides `uri`
    /// - `RPC_USER`: overrides `rpc_user`
    /// - `RPC_PASS`: overrides `rpc_password`
    /// - `RPC_HOST`: overrides `host`
    /// - `RPC_PORT`: overrides `port`
    /// - `RPC_NETWORK`: overrides `network`
    /// - `RPC_WALLET`: overrides `wallet`
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Same as [`NodeConfig::apply_env`] with an injectable lookup.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(uri) = lookup("RPC_URI") {
            self.uri = Some(uri);
        }
        if let Some(user) = lookup("RPC_USER") {
            self.rpc_user = user;
        }
        if let Some(pass) = lookup("RPC_PASS") {
            self.rpc_password = pass;
        }
        if let Some(host) = lookup("RPC_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("RPC_PORT") {
            self.port =
                port.parse().map_err(|_| ConfigError::InvalidEnv { var: "RPC_PORT", value: port })?;
        }
        if let Some(net) = lookup("RPC_NETWORK") {
            if network_from_str(&net).is_none() {
                return Err(ConfigError::InvalidEnv { var: "RPC_NETWORK", value: net });
            }
            self.network = net;
        }
        if let Some(wallet) = lookup("RPC_WALLET") {
            self.wallet = wallet;
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: "regtest".to_string(),
            uri: None,
            wallet: DEFAULT_WALLET.to_string(),
            rpc_user: DEFAULT_RPC_USER.to_string(),
            rpc_password: DEFAULT_RPC_PASSWORD.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cookie_file: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { level: "info".to_string() } }
}

/// Parse network from common strings (case-insensitive). Accepts: regtest, testnet|test,
/// signet, mainnet|main|bitcoin, testnet4.
pub fn network_from_str(s: &str) -> Option<Network> {
    match s.to_ascii_lowercase().as_str() {
        "regtest" => Some(Network::Regtest),
        "testnet" | "test" => Some(Network::Testnet),
        "signet" => Some(Network::Signet),
        "mainnet" | "main" | "bitcoin" => Some(Network::Bitcoin),
        "testnet4" => Some(Network::Testnet4),
        _ => None,
    }
}

impl Config {
    /// Load configuration from a TOML file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save this configuration as a pretty-printed TOML file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Returns the default config file path:
    /// `{config_dir()}/regtest-harness/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir =
            dirs::config_dir().ok_or(ConfigError::ConfigDirUnavailable)?.join("regtest-harness");
        Ok(config_dir.join("config.toml"))
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit `path` must exist. Without one, the default path is used
    /// if present, otherwise built-in defaults. Environment overrides are
    /// applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Ok(default) if default.exists() => Self::from_file(default)?,
                _ => Self::default(),
            },
        };
        config.node.apply_env()?;
        Ok(config)
    }
}
