#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! # `harness-transport`: JSON-RPC Transport Layer
//!
//! This crate defines the **transport abstraction** used to talk to a
//! Bitcoin Core node.
//!
//! ## Core Concepts
//!
//! ### `Transport` Trait
//! Sends one JSON-RPC call (`send`) and returns the decoded `result` value.
//! Backends such as `harness-http` implement this trait to perform their
//! actual I/O work; tests substitute in-memory nodes.
//!
//! ### `TransportError`
//! Separates the two ways a call can fail: the exchange itself broke
//! (connection, timeout, undecodable body) or the node answered with a
//! JSON-RPC `error` object. The latter keeps the numeric code so callers can
//! branch on it (see [`codes`]).
//!
//! ### Envelopes
//! [`JsonRpcRequest`] serializes the JSON-RPC 1.0 request shape Bitcoin Core
//! expects; [`JsonRpcResponse`] splits a decoded body into `result`/`error`.
//! [`RequestIdGenerator`] hands out `<method>_<n>` correlation ids.
//!
//! ## Example
//! ```no_run
//! use transport::{DynTransport, TransportError};
//!
//! async fn demo(transport: DynTransport) -> Result<(), TransportError> {
//!     let info = transport.send("getblockchaininfo", &[]).await?;
//!     println!("chain = {}", info["chain"]);
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type alias for structured error handling in transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// JSON-RPC protocol version string sent in every request envelope.
pub const JSONRPC_VERSION: &str = "1.0";

/// Bitcoin Core RPC error codes the harness reacts to.
pub mod codes {
    /// General wallet error; returned by `createwallet` when the wallet already exists.
    pub const RPC_WALLET_ERROR: i32 = -4;
    /// The requested wallet does not exist or is not loaded.
    pub const RPC_WALLET_NOT_FOUND: i32 = -18;
    /// Client still warming up.
    pub const RPC_IN_WARMUP: i32 = -28;
    /// The wallet is already loaded.
    pub const RPC_WALLET_ALREADY_LOADED: i32 = -35;
}

/// The `error` object of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    /// Numeric error code, see [`codes`].
    pub code: i32,
    /// Human-readable message supplied by the node.
    pub message: String,
}

impl RpcErrorObject {
    /// Build an error object from its parts.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Interpret an arbitrary `error` value.
    ///
    /// Nodes are expected to send `{code, message}`; anything else is kept
    /// verbatim in `message` with code `0`.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone())
            .unwrap_or_else(|_| Self { code: 0, message: value.to_string() })
    }
}

impl fmt::Display for RpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Canonical error type for all transport implementations.
///
/// Every variant except [`TransportError::Rpc`] means the caller could not
/// tell what the node did.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// An HTTP-level failure (connection refused, timeout, or broken stream).
    #[error("HTTP transport error: {0}")]
    Http(String),

    /// Failure to serialize or deserialize a JSON payload.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The node returned an explicit JSON-RPC error object.
    #[error("RPC error: {0}")]
    Rpc(RpcErrorObject),

    /// The JSON-RPC response was missing the expected `result` field.
    #[error("Missing result field")]
    MissingResult,

    /// The response did not conform to the expected JSON-RPC envelope format.
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    /// Any other error not covered by the specific variants above.
    #[error("Other error: {0}")]
    Other(String),
}

impl TransportError {
    /// The JSON-RPC error code, if the node answered with an error object.
    pub fn rpc_code(&self) -> Option<i32> {
        match self {
            TransportError::Rpc(err) => Some(err.code),
            _ => None,
        }
    }

    /// Whether this is an RPC error carrying `code`.
    pub fn is_rpc_code(&self, code: i32) -> bool { self.rpc_code() == Some(code) }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self { TransportError::Serialization(err.to_string()) }
}

impl From<RpcErrorObject> for TransportError {
    fn from(err: RpcErrorObject) -> Self { TransportError::Rpc(err) }
}

/// The base transport trait for single-message delivery.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a single RPC call.
    ///
    /// The request is identified by its `method` name and an ordered list
    /// of parameters. Implementations return the value of the `"result"`
    /// field, [`TransportError::Rpc`] when the node reports an error, or
    /// another [`TransportError`] when the exchange itself failed.
    async fn send(&self, method: &str, params: &[Value]) -> Result<Value>;

    /// Returns the configured endpoint or connection descriptor.
    ///
    /// For network transports, this is the URL.
    /// For mock or in-memory transports, it may be a symbolic name.
    fn endpoint(&self) -> &str;
}

/// Type alias for a shared, dynamically dispatched transport instance.
///
/// ```
/// use transport::DynTransport;
///
/// fn use_transport(t: DynTransport) {
///     println!("Using endpoint: {}", t.endpoint());
/// }
/// ```
pub type DynTransport = Arc<dyn Transport>;

/// A JSON-RPC 1.0 request envelope.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    /// Always [`JSONRPC_VERSION`].
    pub jsonrpc: &'static str,
    /// Correlation id, unique per call.
    pub id: String,
    /// RPC method name.
    pub method: &'a str,
    /// Ordered positional parameters.
    pub params: &'a [Value],
}

impl<'a> JsonRpcRequest<'a> {
    /// Build an envelope for `method` with the given id and parameters.
    pub fn new(id: String, method: &'a str, params: &'a [Value]) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, method, params }
    }
}

/// Minimal structure representing a decoded JSON-RPC response envelope.
///
/// `result` is `Some(Value::Null)` when the node sent `"result": null` and
/// `None` when the field was absent altogether.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcResponse {
    /// The value returned by the RPC call, if present.
    pub result: Option<Value>,
    /// The error object returned by the node, if any and not null.
    pub error: Option<RpcErrorObject>,
    /// The identifier echoed back by the node.
    pub id: Value,
}

impl JsonRpcResponse {
    /// Split a decoded body into its envelope fields.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidFormat`] if `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut map = match value {
            Value::Object(map) => map,
            other => return Err(TransportError::InvalidFormat(other.to_string())),
        };

        let error = match map.remove("error") {
            None | Some(Value::Null) => None,
            Some(err) => Some(RpcErrorObject::from_value(&err)),
        };

        Ok(Self {
            result: map.remove("result"),
            error,
            id: map.remove("id").unwrap_or(Value::Null),
        })
    }

    /// Resolve the envelope into the call outcome.
    ///
    /// A present `error` wins over any `result` sent alongside it.
    pub fn into_result(self) -> Result<Value> {
        if let Some(err) = self.error {
            return Err(TransportError::Rpc(err));
        }
        self.result.ok_or(TransportError::MissingResult)
    }
}

/// Generates JSON-RPC correlation ids of the form `<method>_<n>`.
///
/// `n` starts at a random offset and increases by one per id, so ids never
/// repeat within a generator and rarely collide across generators.
#[derive(Debug)]
pub struct RequestIdGenerator {
    next: AtomicU64,
}

impl RequestIdGenerator {
    /// Create a generator starting at a random offset.
    pub fn new() -> Self {
        let start = rand::thread_rng().gen_range(0..u64::MAX / 2);
        Self::starting_at(start)
    }

    /// Create a generator starting at a fixed offset.
    pub fn starting_at(start: u64) -> Self { Self { next: AtomicU64::new(start) } }

    /// Produce the next id for `method`.
    pub fn next_id(&self, method: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}", method, n)
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self { Self::new() }
}

/// Gets a random free port assigned by the OS.
///
/// This function binds to `127.0.0.1:0`, which causes the OS to assign
/// an available port. The listener is then dropped and the port number
/// is returned.
///
/// # Errors
///
/// Returns an error if binding to the address fails.
pub fn get_random_free_port() -> std::io::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
