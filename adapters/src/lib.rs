#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Node Adapters
//!
//! Clients that drive a live node during automated tests. Each adapter
//! speaks to its node through a [`transport::Transport`], so tests can swap
//! the HTTP backend for an in-memory one.

/// Bitcoin Core wallet bootstrap, address generation and mining
pub mod bitcoin_core {
    /// The node client
    pub mod client;
    /// Per-call options
    pub mod options;
    /// Typed RPC results
    pub mod types;
}

pub mod error;

pub use bitcoin_core::client::NodeClient;
pub use bitcoin_core::options::{MineOptions, NewAddressOptions, SendOptions, WalletOptions};
pub use bitcoin_core::types::{WalletInfo, WalletStatus};
pub use error::{ClientError, ClientResult};
