#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! # `harness-http`: HTTP Transport Backend
//!
//! This crate provides a concrete HTTP-based implementation of the
//! [`transport::Transport`] trait, speaking JSON-RPC 1.0 to Bitcoin Core.
//!
//! ## Overview
//!
//! - Implements [`HttpTransport`], a thin wrapper over [`reqwest::Client`]
//! - Supports unauthenticated, basic-auth and cookie-file credentials
//! - Bounds every request with an optional timeout
//!
//! ## Example
//! ```no_run
//! use harness_http::HttpTransport;
//! use transport::Transport;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let transport = HttpTransport::with_auth(
//!     "http://127.0.0.1:18443/wallet/main.dat",
//!     "user",
//!     "password",
//! );
//!
//! let address = transport.send("getnewaddress", &[]).await.unwrap();
//! println!("{}", address);
//! # });
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use transport::{JsonRpcRequest, JsonRpcResponse, RequestIdGenerator, Transport, TransportError};

/// A concrete implementation of the [`Transport`] trait using HTTP.
///
/// Each call is one POST carrying a JSON-RPC 1.0 envelope with a fresh
/// `<method>_<n>` id. Bitcoin Core reports RPC failures with a non-2xx
/// status and a JSON body, so the body is decoded regardless of status.
///
/// Errors encountered at any stage (HTTP, I/O, JSON parsing, or RPC)
/// are normalized into [`TransportError`] variants for uniform handling.
#[derive(Clone)]
pub struct HttpTransport {
    /// The underlying HTTP client used to perform requests.
    client: reqwest::Client,
    /// The full URL of the JSON-RPC endpoint (e.g. `http://127.0.0.1:18443/wallet/main.dat`).
    url: String,
    /// Optional basic authentication credentials `(username, password)`.
    auth: Option<(String, String)>,
    /// Per-request timeout; `None` waits indefinitely.
    timeout: Option<Duration>,
    /// Shared across clones so ids stay unique per endpoint handle.
    ids: Arc<RequestIdGenerator>,
}

impl HttpTransport {
    /// Constructs a new `HttpTransport` targeting the provided URL.
    ///
    /// This variant does **not** use authentication.
    ///
    /// # Example
    /// ```
    /// use harness_http::HttpTransport;
    /// use transport::Transport;
    ///
    /// let transport = HttpTransport::new("http://127.0.0.1:18443");
    /// assert_eq!(transport.endpoint(), "http://127.0.0.1:18443");
    /// ```
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            auth: None,
            timeout: None,
            ids: Arc::new(RequestIdGenerator::new()),
        }
    }

    /// Constructs a new `HttpTransport` with basic authentication.
    ///
    /// # Parameters
    /// - `url`: Target endpoint (e.g. `http://127.0.0.1:18443/wallet/main.dat`)
    /// - `user`: RPC username
    /// - `pass`: RPC password
    pub fn with_auth(
        url: impl Into<String>,
        user: impl Into<String>,
        pass: impl Into<String>,
    ) -> Self {
        let url_string = url.into();
        logging::trace("HTTP", &format!("→ initializing HTTP transport for {}", url_string));
        Self { auth: Some((user.into(), pass.into())), ..Self::new(url_string) }
    }

    /// Constructs a new `HttpTransport` using credentials from a Bitcoin Core cookie file.
    ///
    /// The cookie file format is a single line containing `username:password`.
    ///
    /// # Errors
    /// Returns `TransportError::Other` if:
    /// - The cookie file cannot be read
    /// - The cookie file is empty or doesn't contain a colon
    pub fn from_cookie_file(
        url: impl Into<String>,
        cookie_path: impl AsRef<Path>,
    ) -> Result<Self, TransportError> {
        let file = File::open(cookie_path.as_ref()).map_err(|e| {
            TransportError::Other(format!("Failed to read cookie file: {}", e))
        })?;

        let line = BufReader::new(file)
            .lines()
            .next()
            .ok_or_else(|| TransportError::Other("Cookie file is empty".to_string()))?
            .map_err(|e| TransportError::Other(format!("Failed to read cookie file: {}", e)))?;

        let (user, pass) = line.split_once(':').ok_or_else(|| {
            TransportError::Other("Invalid cookie file format: missing colon".to_string())
        })?;

        Ok(Self::with_auth(url, user, pass))
    }

    /// Bounds every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured per-request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> { self.timeout }
}

#[async_trait]
impl Transport for HttpTransport {
    /// Sends a single JSON-RPC request and returns its `result` field as JSON.
    ///
    /// # Errors
    /// - [`TransportError::Http`] if the request fails or times out
    /// - [`TransportError::Serialization`] if the body is not JSON
    /// - [`TransportError::Rpc`] if the RPC returns a non-null error object
    /// - [`TransportError::InvalidFormat`] / [`TransportError::MissingResult`]
    ///   if the body is not a JSON-RPC envelope
    async fn send(&self, method: &str, params: &[Value]) -> Result<Value, TransportError> {
        let id = self.ids.next_id(method);
        tracing::debug!(url = %self.url, %method, %id, "→ POST");
        let body = JsonRpcRequest::new(id.clone(), method, params);

        let mut req = self.client.post(&self.url).json(&body);
        if let Some((u, p)) = &self.auth {
            req = req.basic_auth(u, Some(p));
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let resp = req.send().await.map_err(|e| {
            tracing::error!("HTTP Transport - Request failed: {}", e);
            TransportError::Http(e.to_string())
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            tracing::error!("HTTP Transport - Failed to read body: {}", e);
            TransportError::Http(e.to_string())
        })?;

        let val: Value = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(%method, %status, "HTTP Transport - Undecodable body");
            TransportError::Serialization(format!("{} (status: {}, body: {})", e, status, text))
        })?;

        let response = JsonRpcResponse::from_value(val)?;
        if response.id != Value::String(id.clone()) {
            tracing::warn!(%method, expected = %id, got = %response.id, "← response id mismatch");
        }
        let result = response.into_result();
        if let Err(TransportError::Rpc(err)) = &result {
            tracing::debug!(%method, code = err.code, "← RPC error: {}", err.message);
        }
        result
    }

    /// Returns the configured JSON-RPC endpoint URL.
    fn endpoint(&self) -> &str { &self.url }
}
