//! Typed results of the Bitcoin Core wallet calls.

use serde::Deserialize;

/// Result of `createwallet` / `loadwallet`.
///
/// Older nodes send a single `warning` string, newer ones a `warnings` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WalletInfo {
    /// Wallet name as reported by the node.
    pub name: String,
    /// Legacy single warning.
    #[serde(default)]
    pub warning: Option<String>,
    /// Warnings list.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl WalletInfo {
    /// All non-empty warnings from either field.
    pub fn all_warnings(&self) -> Vec<&str> {
        self.warning
            .iter()
            .chain(self.warnings.iter())
            .map(String::as_str)
            .filter(|w| !w.is_empty())
            .collect()
    }
}

/// How `ensure_wallet` found the wallet loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletStatus {
    /// The wallet did not exist and was created.
    Created,
    /// The wallet existed and was loaded.
    Loaded,
    /// The wallet existed and was already loaded.
    AlreadyLoaded,
}
