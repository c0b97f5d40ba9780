use crate::core::config::SessionConfig;
use crate::core::kernel::{TungsteniteTransport, WsConfig};
use crate::core::traits::TradeStore;
use crate::deribit::session::DeribitSession;

/// Builder for assembling a Deribit trading session.
///
/// Produces a disconnected session over the live transport; call
/// `connect` and `authenticate` on the result. Tests bypass the builder
/// via `DeribitSession::with_transport`.
#[derive(Default)]
pub struct DeribitSessionBuilder {
    config: Option<SessionConfig>,
    ws_config: Option<WsConfig>,
    store: Option<Box<dyn TradeStore>>,
}

impl DeribitSessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session configuration (credentials + endpoint)
    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set testnet mode on the held configuration
    #[must_use]
    pub fn with_testnet(mut self, testnet: bool) -> Self {
        if let Some(config) = self.config.take() {
            self.config = Some(config.testnet(testnet));
        }
        self
    }

    /// Set custom transport configuration
    #[must_use]
    pub fn with_ws_config(mut self, ws_config: WsConfig) -> Self {
        self.ws_config = Some(ws_config);
        self
    }

    /// Attach a trade record store. Without one, executed trades are not
    /// persisted.
    #[must_use]
    pub fn with_store(mut self, store: Box<dyn TradeStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Assemble the session. Defaults to an unauthenticated testnet
    /// configuration when none was provided.
    pub fn build(self) -> DeribitSession<TungsteniteTransport> {
        let config = self
            .config
            .unwrap_or_else(|| SessionConfig::new(String::new(), String::new()).testnet(true));

        let mut transport = TungsteniteTransport::new(config.endpoint());
        if let Some(ws_config) = self.ws_config {
            transport = transport.with_config(ws_config);
        }

        DeribitSession::with_transport(transport, config, self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SessionState;

    #[test]
    fn built_session_starts_disconnected() {
        let session = DeribitSessionBuilder::new()
            .with_config(SessionConfig::new("id".into(), "secret".into()).testnet(true))
            .build();

        assert_eq!(session.state(), SessionState::Disconnected);
    }
}
