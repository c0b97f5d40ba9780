use crate::core::errors::SessionError;
use crate::core::kernel::WsTransport;
use crate::core::types::OrderBookSnapshot;
use crate::deribit::conversions;
use crate::deribit::session::DeribitSession;
use crate::deribit::types::BookResult;
use serde_json::json;
use tracing::instrument;

impl<T: WsTransport> DeribitSession<T> {
    /// Fetch the public order book for one instrument.
    ///
    /// Public market data bypasses the authentication gate: the call is
    /// usable as soon as the session is connected, before any handshake.
    #[instrument(skip(self))]
    pub async fn order_book(&self, instrument: &str) -> Result<OrderBookSnapshot, SessionError> {
        let result = self
            .public_call(
                "public/get_order_book",
                json!({ "instrument_name": instrument }),
            )
            .await?;

        let book: BookResult = serde_json::from_value(result)
            .map_err(|e| SessionError::Protocol(format!("malformed order book result: {}", e)))?;

        Ok(conversions::book_snapshot_from_wire(book))
    }
}
