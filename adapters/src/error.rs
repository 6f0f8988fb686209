//! Errors surfaced by the node client.

use config::ConfigError;
use thiserror::Error;
use transport::TransportError;

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by [`crate::NodeClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The call failed in transit or the node answered with an RPC error.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The client could not be built from its configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Startup could not obtain a mining address.
    #[error("Bootstrap failed: could not obtain a mining address: {0}")]
    Bootstrap(#[source] Box<ClientError>),

    /// `mine` was called without an address before any bootstrap.
    #[error("No mining address: pass one explicitly or run bootstrap first")]
    MissingMiningAddress,

    /// The node answered, but not with the shape the method returns.
    #[error("Unexpected result for {method}: {reason}")]
    InvalidResult {
        /// RPC method name.
        method: String,
        /// Decoder message.
        reason: String,
    },

    /// The node kept reporting warmup.
    #[error("Node not ready after {attempts} attempts: {last}")]
    NotReady {
        /// Attempts made.
        attempts: u32,
        /// The last warmup error seen.
        last: TransportError,
    },
}

impl ClientError {
    /// The JSON-RPC error code behind this error, if any.
    pub fn rpc_code(&self) -> Option<i32> {
        match self {
            ClientError::Transport(e) | ClientError::NotReady { last: e, .. } => e.rpc_code(),
            ClientError::Bootstrap(inner) => inner.rpc_code(),
            _ => None,
        }
    }
}
