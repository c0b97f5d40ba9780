/// Session kernel - transport and request plumbing for the exchange link.
///
/// The kernel contains no exchange business logic. It is organized around
/// three layers:
///
/// - `ws`: the WebSocket transport, a strict point-to-point text pipe
///   (`WsTransport`, `TungsteniteTransport`)
/// - `codec`: JSON-RPC 2.0 envelope encoding/decoding and correlation-id
///   generation
/// - `rpc`: the correlated request engine (`RpcClient`), which enforces
///   the single-flight discipline and the uniform result/error contract
///
/// Everything above the kernel talks in domain types; everything below it
/// talks in text frames. The transport is trait-based so tests inject a
/// scripted implementation instead of a live socket.
pub mod codec;
pub mod rpc;
pub mod ws;

// Re-export key types for convenience
pub use codec::{InboundFrame, RequestEnvelope, ResponseEnvelope, RpcErrorObject};
pub use rpc::RpcClient;
pub use ws::{TungsteniteTransport, WsConfig, WsTransport};
