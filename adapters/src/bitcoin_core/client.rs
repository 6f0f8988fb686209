//! A small Bitcoin Core client for test setup.
//!
//! [`NodeClient`] drives one wallet on one node: it makes sure the wallet is
//! loaded, caches an address to mine to, and wraps the handful of RPCs a test
//! needs to fund itself (`getnewaddress`, `sendtoaddress`,
//! `generatetoaddress`). Anything else goes through [`NodeClient::call`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bitcoin::{Amount, Network};
use config::NodeConfig;
use http::HttpTransport;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use transport::{codes, DynTransport, TransportError};

use super::options::{MineOptions, NewAddressOptions, SendOptions, WalletOptions};
use super::types::{WalletInfo, WalletStatus};
use crate::error::{ClientError, ClientResult};

/// Client for one wallet on one Bitcoin Core node.
///
/// The only state beyond the endpoint is the cached mining address, written
/// by [`NodeClient::bootstrap`] through `&mut self`. Use one client per
/// concurrent flow.
pub struct NodeClient {
    transport: DynTransport,
    wallet: String,
    network: Network,
    mining_address: Option<String>,
}

impl fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeClient")
            .field("endpoint", &self.transport.endpoint())
            .field("wallet", &self.wallet)
            .field("network", &self.network)
            .field("mining_address", &self.mining_address)
            .finish()
    }
}

impl NodeClient {
    /// Build an HTTP client from configuration.
    ///
    /// The wallet is the one the endpoint addresses: a `/wallet/<name>`
    /// segment in `uri` wins over `wallet`.
    ///
    /// # Errors
    /// Fails on an unknown network, an unparsable `uri`, or an unreadable
    /// cookie file. No request is sent.
    pub fn new(config: &NodeConfig) -> ClientResult<Self> {
        let network = config.network()?;
        let endpoint = config.endpoint()?;
        let wallet = endpoint.wallet().unwrap_or(&config.wallet).to_string();
        let url = endpoint.url();

        let mut transport = match (&config.cookie_file, &endpoint.credentials) {
            (Some(cookie), _) => HttpTransport::from_cookie_file(url, cookie)?,
            (None, Some(creds)) => HttpTransport::with_auth(url, &creds.user, &creds.password),
            (None, None) => HttpTransport::new(url),
        };
        if let Some(timeout) = config.timeout() {
            transport = transport.with_timeout(timeout);
        }

        info!(%endpoint, %network, %wallet, timeout = ?transport.timeout(), "node client configured");
        Ok(Self::from_transport(Arc::new(transport), wallet, network))
    }

    /// Wrap an existing transport. `wallet` must be the wallet the
    /// transport's endpoint addresses.
    pub fn from_transport(transport: DynTransport, wallet: impl Into<String>, network: Network) -> Self {
        Self { transport, wallet: wallet.into(), network, mining_address: None }
    }

    /// The default wallet name.
    pub fn wallet(&self) -> &str { &self.wallet }

    /// The network label.
    pub fn network(&self) -> Network { self.network }

    /// The transport's endpoint.
    pub fn endpoint(&self) -> &str { self.transport.endpoint() }

    /// The address cached by the last successful bootstrap.
    pub fn mining_address(&self) -> Option<&str> { self.mining_address.as_deref() }

    /// Send one RPC call and return its raw `result`.
    ///
    /// Transport faults and node-reported errors both come back as
    /// [`TransportError`]; use [`TransportError::rpc_code`] to tell them apart.
    pub async fn call(&self, method: &str, params: &[Value]) -> Result<Value, TransportError> {
        let result = self.transport.send(method, params).await;
        match &result {
            Err(TransportError::Rpc(err)) => debug!(%method, code = err.code, "RPC error: {}", err.message),
            Err(e) => warn!(%method, "Failed API call: {}", e),
            Ok(_) => {}
        }
        result
    }

    /// [`NodeClient::call`] with the result decoded into `T`.
    pub async fn call_as<T: DeserializeOwned>(&self, method: &str, params: &[Value]) -> ClientResult<T> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value).map_err(|e| ClientError::InvalidResult {
            method: method.to_string(),
            reason: e.to_string(),
        })
    }

    /// Make sure the default wallet is loaded.
    ///
    /// Tries `createwallet`; on `-4` (wallet exists) falls back to
    /// `loadwallet`, where `-35` (already loaded) also counts as loaded.
    /// Safe to call repeatedly.
    pub async fn ensure_wallet(&self) -> ClientResult<WalletStatus> {
        let opts = WalletOptions::default();

        let create_err = match self.create_wallet(&opts).await {
            Ok(info) => {
                info!(wallet = %info.name, "created wallet");
                log_warnings(&info);
                return Ok(WalletStatus::Created);
            }
            Err(ClientError::Transport(e)) if e.is_rpc_code(codes::RPC_WALLET_ERROR) => e,
            Err(e) => {
                error!(wallet = %self.wallet, "createwallet failed: {}", e);
                return Err(e);
            }
        };

        debug!(wallet = %self.wallet, "wallet exists ({}), loading", create_err);
        match self.load_wallet(&opts).await {
            Ok(info) => {
                info!(wallet = %info.name, "loaded wallet");
                log_warnings(&info);
                Ok(WalletStatus::Loaded)
            }
            Err(ClientError::Transport(e)) if e.is_rpc_code(codes::RPC_WALLET_ALREADY_LOADED) => {
                debug!(wallet = %self.wallet, "wallet already loaded");
                Ok(WalletStatus::AlreadyLoaded)
            }
            Err(e) => {
                error!(wallet = %self.wallet, "loadwallet failed: {}", e);
                Err(e)
            }
        }
    }

    /// Load the wallet and cache a fresh mining address.
    ///
    /// # Errors
    /// Wallet errors propagate as-is. Failing to get an address is a
    /// [`ClientError::Bootstrap`] and leaves the cached address untouched.
    pub async fn bootstrap(&mut self) -> ClientResult<String> {
        self.ensure_wallet().await?;

        let address = self.get_new_address(&NewAddressOptions::default()).await.map_err(|e| {
            error!(wallet = %self.wallet, "failed to create addr: {}", e);
            ClientError::Bootstrap(Box::new(e))
        })?;

        info!(%address, "mining address ready");
        self.mining_address = Some(address.clone());
        Ok(address)
    }

    /// Poll `getnetworkinfo` until the node leaves warmup (`-28`).
    ///
    /// Any other error is returned immediately.
    pub async fn wait_until_ready(&self, max_attempts: u32, interval: Duration) -> ClientResult<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.call("getnetworkinfo", &[]).await {
                Ok(_) => {
                    if attempt > 1 {
                        debug!("Node initialization completed after {} attempts", attempt);
                    }
                    return Ok(());
                }
                Err(e) if e.is_rpc_code(codes::RPC_IN_WARMUP) => {
                    if attempt >= max_attempts {
                        return Err(ClientError::NotReady { attempts: attempt, last: e });
                    }
                    debug!("Waiting for initialization: {} (attempt {}/{})", e, attempt, max_attempts);
                    tokio::time::sleep(interval).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// `getnewaddress` with the given label and type.
    pub async fn get_new_address(&self, opts: &NewAddressOptions) -> ClientResult<String> {
        self.call_as("getnewaddress", &opts.to_params()).await
    }

    /// `createwallet [filename]`.
    pub async fn create_wallet(&self, opts: &WalletOptions) -> ClientResult<WalletInfo> {
        self.call_as("createwallet", &[json!(self.wallet_name(opts))]).await
    }

    /// `loadwallet [filename]`.
    pub async fn load_wallet(&self, opts: &WalletOptions) -> ClientResult<WalletInfo> {
        self.call_as("loadwallet", &[json!(self.wallet_name(opts))]).await
    }

    /// `unloadwallet`.
    ///
    /// The client's own wallet is unloaded through its endpoint with no
    /// name parameter. Any other name is passed through; the node rejects it
    /// with `-8` when the endpoint is bound to a different wallet, so use a
    /// client for that wallet instead.
    pub async fn unload_wallet(&self, opts: &WalletOptions) -> ClientResult<()> {
        let name = self.wallet_name(opts);
        let params = if name == self.wallet { vec![] } else { vec![json!(name)] };
        self.call("unloadwallet", &params).await?;
        Ok(())
    }

    /// `sendtoaddress [address, amount]`; returns the txid.
    pub async fn send_to_address(&self, opts: &SendOptions) -> ClientResult<String> {
        self.call_as("sendtoaddress", &opts.to_params()).await
    }

    /// `generatetoaddress [blocks, address]`; returns the block hashes.
    ///
    /// An empty address counts as absent. An explicit block count of 0 is
    /// sent as is.
    ///
    /// # Errors
    /// [`ClientError::MissingMiningAddress`] if no address is given and
    /// none has been cached by [`NodeClient::bootstrap`].
    pub async fn mine(&self, opts: &MineOptions) -> ClientResult<Vec<String>> {
        let address = opts
            .address
            .as_deref()
            .filter(|a| !a.is_empty())
            .or(self.mining_address.as_deref())
            .ok_or(ClientError::MissingMiningAddress)?;
        let blocks = opts.blocks.unwrap_or(1);

        self.call_as("generatetoaddress", &[json!(blocks), json!(address)]).await
    }

    /// `getbalance` of the wallet.
    pub async fn get_balance(&self) -> ClientResult<Amount> {
        let btc: f64 = self.call_as("getbalance", &[]).await?;
        Amount::from_btc(btc).map_err(|e| ClientError::InvalidResult {
            method: "getbalance".to_string(),
            reason: e.to_string(),
        })
    }

    /// `listwallets`: names of the loaded wallets.
    pub async fn list_wallets(&self) -> ClientResult<Vec<String>> { self.call_as("listwallets", &[]).await }

    fn wallet_name<'a>(&'a self, opts: &'a WalletOptions) -> &'a str {
        opts.filename.as_deref().unwrap_or(&self.wallet)
    }
}

fn log_warnings(info: &WalletInfo) {
    for warning in info.all_warnings() {
        warn!(wallet = %info.name, "{}", warning);
    }
}
