use crate::core::errors::SessionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

/// One JSON-RPC 2.0 request, immutable once sent. The `id` is the
/// correlation key echoed back by the exchange.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl RequestEnvelope {
    /// Build an envelope with a fresh correlation id.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: next_request_id(),
            method: method.into(),
            params,
        }
    }

    /// Encode to the wire as `{"jsonrpc":"2.0","id":..,"method":..,"params":..}`.
    pub fn encode(&self) -> Result<String, SessionError> {
        serde_json::to_string(self)
            .map_err(|e| SessionError::Protocol(format!("failed to encode request: {}", e)))
    }
}

/// Error object of a JSON-RPC error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// One decoded JSON-RPC 2.0 response. Exactly one of `result`/`error` is
/// present; the decoder rejects frames satisfying neither.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub id: u64,
    pub result: Option<Value>,
    pub error: Option<RpcErrorObject>,
}

impl ResponseEnvelope {
    /// Apply the uniform response contract: an `error` fails with
    /// `SessionError::Exchange`, otherwise the `result` value is returned.
    pub fn into_result(self) -> Result<Value, SessionError> {
        if let Some(err) = self.error {
            return Err(SessionError::Exchange {
                code: err.code,
                message: err.message,
            });
        }
        // decode() guarantees result is present when error is not
        self.result
            .ok_or_else(|| SessionError::Protocol("response carries no result".to_string()))
    }
}

/// An inbound frame is either the reply to an outstanding request or a
/// server-initiated notification (subscription data, heartbeats). The
/// request engine discards notifications while waiting for its reply.
#[derive(Debug, Clone)]
pub enum InboundFrame {
    Response(ResponseEnvelope),
    Notification { method: String },
}

/// Decode one inbound text frame. Malformed JSON, or a response missing
/// both `result` and `error`, is a `Protocol` error.
pub fn decode(text: &str) -> Result<InboundFrame, SessionError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| SessionError::Protocol(format!("malformed JSON frame: {}", e)))?;

    if let Some(method) = value.get("method").and_then(Value::as_str) {
        return Ok(InboundFrame::Notification {
            method: method.to_string(),
        });
    }

    let id = value
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| SessionError::Protocol("response frame without an id".to_string()))?;

    let result = value.get("result").cloned();
    let error = match value.get("error") {
        Some(raw) => Some(
            serde_json::from_value::<RpcErrorObject>(raw.clone()).map_err(|e| {
                SessionError::Protocol(format!("malformed error object: {}", e))
            })?,
        ),
        None => None,
    };

    if result.is_none() && error.is_none() {
        return Err(SessionError::Protocol(
            "response carries neither result nor error".to_string(),
        ));
    }

    Ok(InboundFrame::Response(ResponseEnvelope { id, result, error }))
}

/// Next correlation id, strictly increasing for the process lifetime.
///
/// Seeded once from the Unix timestamp so ids stay recognizable in
/// exchange-side logs, then advanced atomically: two calls within the
/// same clock tick still receive distinct ids.
pub fn next_request_id() -> u64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter =
        COUNTER.get_or_init(|| AtomicU64::new(chrono::Utc::now().timestamp().unsigned_abs()));
    counter.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encode_produces_jsonrpc_envelope() {
        let envelope = RequestEnvelope::new("private/buy", json!({"amount": 10.0}));
        let text = envelope.encode().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "private/buy");
        assert_eq!(value["params"]["amount"], 10.0);
        assert_eq!(value["id"].as_u64().unwrap(), envelope.id);
    }

    #[test]
    fn decode_result_frame() {
        let frame = decode(r#"{"jsonrpc":"2.0","id":42,"result":{"ok":true}}"#).unwrap();
        match frame {
            InboundFrame::Response(resp) => {
                assert_eq!(resp.id, 42);
                let result = resp.into_result().unwrap();
                assert_eq!(result["ok"], true);
            }
            InboundFrame::Notification { .. } => panic!("expected response"),
        }
    }

    #[test]
    fn decode_error_frame() {
        let frame =
            decode(r#"{"jsonrpc":"2.0","id":7,"error":{"code":11044,"message":"not_open_order"}}"#)
                .unwrap();
        match frame {
            InboundFrame::Response(resp) => {
                let err = resp.into_result().unwrap_err();
                assert!(matches!(
                    err,
                    SessionError::Exchange { code: 11044, ref message } if message == "not_open_order"
                ));
            }
            InboundFrame::Notification { .. } => panic!("expected response"),
        }
    }

    #[test]
    fn notification_is_classified_not_matched() {
        let frame = decode(
            r#"{"jsonrpc":"2.0","method":"subscription","params":{"channel":"ticker.BTC-PERPETUAL.100ms"}}"#,
        )
        .unwrap();
        assert!(matches!(
            frame,
            InboundFrame::Notification { ref method } if method == "subscription"
        ));
    }

    #[test]
    fn malformed_json_is_protocol_error() {
        let err = decode("{not json").unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
    }

    #[test]
    fn frame_without_result_or_error_is_rejected() {
        let err = decode(r#"{"jsonrpc":"2.0","id":3}"#).unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
    }

    #[test]
    fn request_ids_are_strictly_increasing() {
        let ids: Vec<u64> = (0..64).map(|_| next_request_id()).collect();
        for pair in ids.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }
}
