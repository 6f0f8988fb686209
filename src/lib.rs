// SPDX-License-Identifier: CC0-1.0

//! Regtest harness umbrella crate.
//!
//! Re-exports the pieces a test needs to drive a Bitcoin Core node: the
//! [`NodeClient`], its configuration, and the transport it speaks through.
//!
//! ```no_run
//! # async fn demo() -> Result<(), regtest_harness::ClientError> {
//! use regtest_harness::{Config, MineOptions, NodeClient};
//!
//! let config = Config::load(None)?;
//! let mut client = NodeClient::new(&config.node)?;
//! client.bootstrap().await?;
//! client.mine(&MineOptions::new().blocks(101)).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
#![warn(deprecated_in_future)]
#![doc(test(attr(warn(unused))))]

pub use adapters::{
    ClientError, ClientResult, MineOptions, NewAddressOptions, NodeClient, SendOptions, WalletInfo,
    WalletOptions, WalletStatus,
};
pub use config::{Config, ConfigError, Credentials, Endpoint, LoggingConfig, NodeConfig};
pub use http::HttpTransport;
pub use transport::{codes, DynTransport, RpcErrorObject, Transport, TransportError};

/// Miscellaneous metadata about the harness.
pub mod harness_meta {
    /// Version string for the umbrella crate, as reported by Cargo.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
