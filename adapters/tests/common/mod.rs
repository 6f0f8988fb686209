//! An in-memory stand-in for a regtest `bitcoind`.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use transport::{codes, RpcErrorObject, Transport, TransportError};

#[derive(Default)]
struct NodeState {
    on_disk: BTreeSet<String>,
    loaded: BTreeSet<String>,
    calls: Vec<(String, Vec<Value>)>,
    endpoints: Vec<String>,
    failures: HashMap<String, VecDeque<TransportError>>,
    warmup_remaining: u32,
    addresses_issued: u32,
}

/// Tracks wallet files and loaded wallets the way the node does, records
/// every call, and can be told to fail specific methods.
///
/// Each handle is one `/wallet/<name>` endpoint of the node; handles made
/// with [`FakeNode::at_wallet`] share the node's state. Wallet-scoped calls
/// answer `-18` unless the endpoint's wallet is loaded.
pub struct FakeNode {
    state: Arc<Mutex<NodeState>>,
    wallet: String,
    endpoint: String,
}

#[allow(dead_code)]
impl FakeNode {
    /// A node with no wallets, reached through `/wallet/main.dat`.
    pub fn new() -> Arc<Self> { Self::bind(Arc::default(), "main.dat") }

    /// A node that already has `wallet` on disk, reached through `/wallet/main.dat`.
    pub fn with_wallet(wallet: &str, loaded: bool) -> Arc<Self> {
        let node = Self::new();
        {
            let mut state = node.state.lock().expect("state lock");
            state.on_disk.insert(wallet.to_string());
            if loaded {
                state.loaded.insert(wallet.to_string());
            }
        }
        node
    }

    /// The same node reached through `/wallet/<wallet>`.
    pub fn at_wallet(&self, wallet: &str) -> Arc<Self> { Self::bind(self.state.clone(), wallet) }

    fn bind(state: Arc<Mutex<NodeState>>, wallet: &str) -> Arc<Self> {
        Arc::new(Self {
            state,
            wallet: wallet.to_string(),
            endpoint: format!("fake://bitcoind/wallet/{}", wallet),
        })
    }

    /// Fail the next call to `method` with `err`.
    pub fn fail_next(&self, method: &str, err: TransportError) {
        let mut state = self.state.lock().expect("state lock");
        state.failures.entry(method.to_string()).or_default().push_back(err);
    }

    /// Answer `getnetworkinfo` with the warmup error `rounds` times.
    pub fn set_warmup(&self, rounds: u32) {
        self.state.lock().expect("state lock").warmup_remaining = rounds;
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().expect("state lock").calls.clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Vec<Value>> {
        self.calls().into_iter().filter(|(m, _)| m == method).map(|(_, p)| p).collect()
    }

    /// Endpoint wallet of every call, in order.
    pub fn endpoints(&self) -> Vec<String> {
        self.state.lock().expect("state lock").endpoints.clone()
    }

    pub fn is_loaded(&self, wallet: &str) -> bool {
        self.state.lock().expect("state lock").loaded.contains(wallet)
    }
}

pub fn rpc_error(code: i32, message: &str) -> TransportError {
    TransportError::Rpc(RpcErrorObject::new(code, message))
}

fn wallet_not_loaded() -> TransportError {
    rpc_error(codes::RPC_WALLET_NOT_FOUND, "Requested wallet does not exist or is not loaded")
}

#[async_trait::async_trait]
impl Transport for FakeNode {
    async fn send(&self, method: &str, params: &[Value]) -> Result<Value, TransportError> {
        let mut state = self.state.lock().expect("state lock");
        state.calls.push((method.to_string(), params.to_vec()));
        state.endpoints.push(self.wallet.clone());

        if let Some(err) = state.failures.get_mut(method).and_then(VecDeque::pop_front) {
            return Err(err);
        }

        let named = params.first().and_then(Value::as_str).map(str::to_string);
        let first = named.clone().unwrap_or_default();
        let endpoint_loaded = state.loaded.contains(&self.wallet);
        match method {
            "createwallet" => {
                if state.on_disk.contains(&first) {
                    return Err(rpc_error(
                        codes::RPC_WALLET_ERROR,
                        "Wallet file verification failed. Database already exists.",
                    ));
                }
                state.on_disk.insert(first.clone());
                state.loaded.insert(first.clone());
                Ok(json!({"name": first, "warning": ""}))
            }
            "loadwallet" => {
                if state.loaded.contains(&first) {
                    return Err(rpc_error(
                        codes::RPC_WALLET_ALREADY_LOADED,
                        &format!("Wallet \"{}\" is already loaded.", first),
                    ));
                }
                if !state.on_disk.contains(&first) {
                    return Err(rpc_error(codes::RPC_WALLET_NOT_FOUND, "Wallet file not found."));
                }
                state.loaded.insert(first.clone());
                Ok(json!({"name": first, "warning": ""}))
            }
            "unloadwallet" => {
                if named.as_deref().is_some_and(|name| name != self.wallet) {
                    return Err(rpc_error(
                        -8,
                        "RPC endpoint wallet and wallet_name parameter specify different wallets",
                    ));
                }
                if !state.loaded.remove(&self.wallet) {
                    return Err(wallet_not_loaded());
                }
                Ok(json!({"warning": ""}))
            }
            "getnewaddress" | "sendtoaddress" | "getbalance" if !endpoint_loaded => {
                Err(wallet_not_loaded())
            }
            "getnewaddress" => {
                state.addresses_issued += 1;
                Ok(json!(format!("bcrt1qfake{:04}", state.addresses_issued)))
            }
            "generatetoaddress" => {
                let blocks = params.first().and_then(Value::as_u64).unwrap_or_default();
                let hashes: Vec<String> = (0..blocks).map(|h| format!("{:064x}", h)).collect();
                Ok(json!(hashes))
            }
            "sendtoaddress" => Ok(json!(format!("{:064x}", 0xfeed))),
            "getnetworkinfo" => {
                if state.warmup_remaining > 0 {
                    state.warmup_remaining -= 1;
                    return Err(rpc_error(codes::RPC_IN_WARMUP, "Loading block index..."));
                }
                Ok(json!({"version": 300000, "networkactive": true}))
            }
            "getbalance" => Ok(json!(50.0)),
            "listwallets" => Ok(json!(state.loaded.iter().collect::<Vec<_>>())),
            _ => Err(rpc_error(-32601, "Method not found")),
        }
    }

    fn endpoint(&self) -> &str { &self.endpoint }
}
