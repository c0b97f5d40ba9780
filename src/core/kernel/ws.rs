use crate::core::errors::SessionError;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, instrument, warn};

/// WebSocket transport configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000, // 10 seconds
        }
    }
}

/// Strict point-to-point text pipe over one WebSocket connection.
///
/// Callers above this layer assume no internal buffering of multiple
/// in-flight messages: one `send_text` corresponds to frames later pulled
/// out one at a time with `recv_text`. Control frames (ping/pong) are
/// handled here and never surface.
#[async_trait]
pub trait WsTransport: Send + Sync {
    /// Open the connection.
    async fn connect(&mut self) -> Result<(), SessionError>;

    /// Send one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), SessionError>;

    /// Receive the next text frame. A closed or reset connection is a
    /// `Transport` error and leaves the pipe disconnected.
    async fn recv_text(&mut self) -> Result<String, SessionError>;

    /// Close the connection.
    async fn close(&mut self) -> Result<(), SessionError>;

    /// Check if the connection is alive.
    fn is_connected(&self) -> bool;
}

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Tungstenite-based transport implementation.
pub struct TungsteniteTransport {
    url: String,
    write: Option<futures_util::stream::SplitSink<WsStream, Message>>,
    read: Option<futures_util::stream::SplitStream<WsStream>>,
    connected: bool,
    config: WsConfig,
}

impl TungsteniteTransport {
    /// Create a transport for the given endpoint. Nothing is opened until
    /// `connect` is called.
    pub fn new(url: String) -> Self {
        Self {
            url,
            write: None,
            read: None,
            connected: false,
            config: WsConfig::default(),
        }
    }

    /// Set custom transport configuration
    pub fn with_config(mut self, config: WsConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl WsTransport for TungsteniteTransport {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn connect(&mut self) -> Result<(), SessionError> {
        let connect_timeout = Duration::from_millis(self.config.connect_timeout_ms);

        let (ws_stream, _) = tokio::time::timeout(connect_timeout, connect_async(&self.url))
            .await
            .map_err(|_| SessionError::Transport("WebSocket connection timeout".to_string()))?
            .map_err(|e| {
                SessionError::Transport(format!("WebSocket connection failed: {}", e))
            })?;

        let (write, read) = ws_stream.split();
        self.write = Some(write);
        self.read = Some(read);
        self.connected = true;

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_text(&mut self, text: String) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::Transport(
                "WebSocket not connected".to_string(),
            ));
        }

        let write = self.write.as_mut().ok_or_else(|| {
            SessionError::Transport("WebSocket write stream not available".to_string())
        })?;

        write.send(Message::Text(text)).await.map_err(|e| {
            self.connected = false;
            SessionError::Transport(format!("Failed to send WebSocket message: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn recv_text(&mut self) -> Result<String, SessionError> {
        loop {
            if !self.connected {
                return Err(SessionError::Transport(
                    "WebSocket not connected".to_string(),
                ));
            }

            let read = self.read.as_mut().ok_or_else(|| {
                SessionError::Transport("WebSocket read stream not available".to_string())
            })?;

            match read.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Binary(data))) => {
                    // some gateways compress text frames into binary ones
                    return String::from_utf8(data).map_err(|e| {
                        SessionError::Protocol(format!("non-UTF-8 binary frame: {}", e))
                    });
                }
                Some(Ok(Message::Ping(data))) => {
                    // answered at transport level, invisible to callers
                    debug!("answering WebSocket ping");
                    if let Some(write) = self.write.as_mut() {
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            warn!("failed to send pong response: {}", e);
                        }
                    }
                }
                Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(_))) => {
                    self.connected = false;
                    return Err(SessionError::Transport(
                        "connection closed by peer".to_string(),
                    ));
                }
                Some(Err(e)) => {
                    self.connected = false;
                    return Err(SessionError::Transport(format!("WebSocket error: {}", e)));
                }
                None => {
                    self.connected = false;
                    return Err(SessionError::Transport(
                        "WebSocket stream ended".to_string(),
                    ));
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn close(&mut self) -> Result<(), SessionError> {
        if let Some(write) = self.write.as_mut() {
            let _ = write.send(Message::Close(None)).await;
        }
        self.connected = false;
        self.write = None;
        self.read = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
