//! Per-call options for the convenience operations.
//!
//! Every option is optional except where the node itself requires a value;
//! unset options fall back to the client's configured defaults.

use bitcoin::Amount;
use serde_json::{json, Value};

/// Options for `getnewaddress`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAddressOptions {
    /// Address label.
    pub label: Option<String>,
    /// Address type (`legacy`, `p2sh-segwit`, `bech32`, `bech32m`).
    pub address_type: Option<String>,
}

impl NewAddressOptions {
    /// No label, node-default address type.
    pub fn new() -> Self { Self::default() }

    /// Set the label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the address type.
    pub fn address_type(mut self, address_type: impl Into<String>) -> Self {
        self.address_type = Some(address_type.into());
        self
    }

    /// Positional parameters in node order. The label slot is filled with
    /// `""` (the node's default) when only the type is given.
    pub fn to_params(&self) -> Vec<Value> {
        match (&self.label, &self.address_type) {
            (None, None) => vec![],
            (Some(label), None) => vec![json!(label)],
            (label, Some(address_type)) => {
                vec![json!(label.as_deref().unwrap_or_default()), json!(address_type)]
            }
        }
    }
}

/// Options for `createwallet`, `loadwallet` and `unloadwallet`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletOptions {
    /// Wallet file name; defaults to the client's wallet.
    pub filename: Option<String>,
}

impl WalletOptions {
    /// Target a specific wallet file.
    pub fn named(filename: impl Into<String>) -> Self { Self { filename: Some(filename.into()) } }
}

/// Options for `sendtoaddress`.
///
/// Neither field is validated locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOptions {
    /// Destination address.
    pub address: String,
    /// Amount to send.
    pub amount: Amount,
}

impl SendOptions {
    /// Send `amount` to `address`.
    pub fn new(address: impl Into<String>, amount: Amount) -> Self {
        Self { address: address.into(), amount }
    }

    /// `[address, amount_in_btc]`.
    pub fn to_params(&self) -> Vec<Value> { vec![json!(self.address), json!(self.amount.to_btc())] }
}

/// Options for `generatetoaddress`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MineOptions {
    /// Number of blocks; defaults to 1.
    pub blocks: Option<u64>,
    /// Reward address; defaults to the cached mining address.
    pub address: Option<String>,
}

impl MineOptions {
    /// One block to the cached mining address.
    pub fn new() -> Self { Self::default() }

    /// Set the block count.
    pub fn blocks(mut self, blocks: u64) -> Self {
        self.blocks = Some(blocks);
        self
    }

    /// Set the reward address.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}
