use crate::core::errors::SessionError;
use crate::core::kernel::codec::{self, InboundFrame, RequestEnvelope};
use crate::core::kernel::ws::WsTransport;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Correlated request engine: converts the duplex WebSocket into a
/// synchronous call/response abstraction.
///
/// At most one request is outstanding per session. The transport sits
/// behind a `tokio::sync::Mutex` held for the whole send/await cycle, so a
/// second concurrent `call` blocks until the first completes instead of
/// interleaving frames.
///
/// Discard policy: while awaiting a reply, server notifications (frames
/// carrying a `method` and no matching id) are logged and skipped; a
/// *response* whose id differs from the outstanding request's id is a
/// `Protocol` error, because correlation state is corrupt at that point
/// and the session must be discarded.
pub struct RpcClient<T: WsTransport> {
    transport: Mutex<T>,
}

impl<T: WsTransport> RpcClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Mutex::new(transport),
        }
    }

    pub async fn connect(&self) -> Result<(), SessionError> {
        self.transport.lock().await.connect().await
    }

    pub async fn close(&self) -> Result<(), SessionError> {
        self.transport.lock().await.close().await
    }

    pub async fn is_connected(&self) -> bool {
        self.transport.lock().await.is_connected()
    }

    /// Issue one JSON-RPC call and await its correlated reply.
    ///
    /// No timeout is applied: if the exchange never replies, this call
    /// blocks indefinitely. Hardening would require a timeout plus forced
    /// reconnection, since a reply for an abandoned request could still
    /// arrive and corrupt correlation.
    #[instrument(skip(self, params), fields(method = %method))]
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, SessionError> {
        let mut transport = self.transport.lock().await;

        let request = RequestEnvelope::new(method, params);
        let request_id = request.id;
        transport.send_text(request.encode()?).await?;

        loop {
            let text = transport.recv_text().await?;
            match codec::decode(&text)? {
                InboundFrame::Notification { method } => {
                    debug!(notification = %method, "discarding unsolicited frame");
                }
                InboundFrame::Response(response) => {
                    if response.id != request_id {
                        return Err(SessionError::Protocol(format!(
                            "response id {} does not match outstanding request id {}",
                            response.id, request_id
                        )));
                    }
                    return response.into_result();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Transport fed from a script. Replies may reference the id of the
    /// most recently sent request through the `__ID__` placeholder.
    struct ScriptedTransport {
        replies: VecDeque<String>,
        sent: Vec<String>,
        last_id: u64,
        connected: bool,
    }

    impl ScriptedTransport {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: replies.iter().map(|s| (*s).to_string()).collect(),
                sent: Vec::new(),
                last_id: 0,
                connected: true,
            }
        }
    }

    #[async_trait]
    impl WsTransport for ScriptedTransport {
        async fn connect(&mut self) -> Result<(), SessionError> {
            self.connected = true;
            Ok(())
        }

        async fn send_text(&mut self, text: String) -> Result<(), SessionError> {
            let value: Value = serde_json::from_str(&text).unwrap();
            self.last_id = value["id"].as_u64().unwrap();
            self.sent.push(text);
            Ok(())
        }

        async fn recv_text(&mut self) -> Result<String, SessionError> {
            self.replies
                .pop_front()
                .map(|r| r.replace("__ID__", &self.last_id.to_string()))
                .ok_or_else(|| SessionError::Transport("script exhausted".to_string()))
        }

        async fn close(&mut self) -> Result<(), SessionError> {
            self.connected = false;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    #[tokio::test]
    async fn call_returns_matching_result() {
        let client = RpcClient::new(ScriptedTransport::new(&[
            r#"{"jsonrpc":"2.0","id":__ID__,"result":{"answer":1}}"#,
        ]));

        let result = client.call("public/test", json!({})).await.unwrap();
        assert_eq!(result["answer"], 1);
    }

    #[tokio::test]
    async fn notifications_are_discarded_while_waiting() {
        let client = RpcClient::new(ScriptedTransport::new(&[
            r#"{"jsonrpc":"2.0","method":"heartbeat","params":{}}"#,
            r#"{"jsonrpc":"2.0","method":"subscription","params":{"channel":"ticker"}}"#,
            r#"{"jsonrpc":"2.0","id":__ID__,"result":"late but right"}"#,
        ]));

        let result = client.call("public/test", json!({})).await.unwrap();
        assert_eq!(result, "late but right");
    }

    #[tokio::test]
    async fn mismatched_response_id_is_protocol_error() {
        let client = RpcClient::new(ScriptedTransport::new(&[
            r#"{"jsonrpc":"2.0","id":999999999,"result":"stale"}"#,
        ]));

        let err = client.call("public/test", json!({})).await.unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
    }

    #[tokio::test]
    async fn exchange_error_applies_uniform_contract() {
        let client = RpcClient::new(ScriptedTransport::new(&[
            r#"{"jsonrpc":"2.0","id":__ID__,"error":{"code":13004,"message":"invalid_credentials"}}"#,
        ]));

        let err = client.call("public/auth", json!({})).await.unwrap_err();
        assert!(matches!(err, SessionError::Exchange { code: 13004, .. }));
    }

    #[tokio::test]
    async fn concurrent_calls_stay_single_flight() {
        let client = Arc::new(RpcClient::new(ScriptedTransport::new(&[
            r#"{"jsonrpc":"2.0","id":__ID__,"result":"first"}"#,
            r#"{"jsonrpc":"2.0","id":__ID__,"result":"second"}"#,
        ])));

        let a = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.call("public/test", json!({"n":1})).await })
        };
        let b = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.call("public/test", json!({"n":2})).await })
        };

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());

        // whichever call went second was never cross-matched with the
        // first call's reply
        assert_ne!(a, b);
        assert!(a == "first" || a == "second");
        assert!(b == "first" || b == "second");
    }
}
