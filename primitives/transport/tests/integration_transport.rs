//! Integration tests for the shared transport API.
//!
//! These exercise consumer usage patterns without requiring a running
//! Bitcoin Core instance.

use std::sync::Arc;

use transport::{codes, DynTransport, RpcErrorObject, Transport, TransportError};

struct DummyTransport;

#[async_trait::async_trait]
impl transport::Transport for DummyTransport {
    async fn send(
        &self,
        method: &str,
        _params: &[serde_json::Value],
    ) -> Result<serde_json::Value, TransportError> {
        match method {
            "createwallet" => Err(RpcErrorObject::new(codes::RPC_WALLET_ERROR, "exists").into()),
            "unreachable" => Err(TransportError::Http("connection refused".to_string())),
            _ => Ok(serde_json::json!({"ok": true})),
        }
    }

    fn endpoint(&self) -> &str { "dummy://" }
}

#[tokio::test]
async fn consumer_can_call_transport() {
    let t = DummyTransport;
    let v = t.send("ping", &[]).await.expect("ok");
    assert_eq!(v["ok"], true);
}

#[tokio::test]
async fn consumer_sees_rpc_error_code() {
    let t: DynTransport = Arc::new(DummyTransport);
    let err = t.send("createwallet", &[]).await.expect_err("should err");
    assert!(err.is_rpc_code(codes::RPC_WALLET_ERROR));
    assert_eq!(t.endpoint(), "dummy://");
}

#[tokio::test]
async fn consumer_tells_transport_faults_apart() {
    let t = DummyTransport;
    let err = t.send("unreachable", &[]).await.expect_err("should err");
    assert_eq!(err.rpc_code(), None);
    assert!(matches!(err, TransportError::Http(_)));
}
