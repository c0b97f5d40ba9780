use crate::core::errors::SessionError;
use crate::core::kernel::WsTransport;
use crate::core::types::OpenOrder;
use crate::deribit::conversions;
use crate::deribit::session::DeribitSession;
use crate::deribit::types::OpenOrderInfo;
use serde_json::json;
use tracing::instrument;

impl<T: WsTransport> DeribitSession<T> {
    /// Snapshot of the currently open limit orders for one currency.
    ///
    /// Queries `private/get_open_orders_by_currency` with `kind=future`
    /// and filters client-side: the exchange payload may interleave
    /// market and stop orders, only limit orders are reported. The result
    /// is finite and recomputed on each call, never cached.
    #[instrument(skip(self))]
    pub async fn open_limit_orders(&self, currency: &str) -> Result<Vec<OpenOrder>, SessionError> {
        let result = self
            .private_call(
                "private/get_open_orders_by_currency",
                json!({ "currency": currency, "kind": "future" }),
            )
            .await?;

        let orders: Vec<OpenOrderInfo> = serde_json::from_value(result)
            .map_err(|e| SessionError::Protocol(format!("malformed open orders result: {}", e)))?;

        Ok(orders
            .iter()
            .filter(|o| o.order_type == "limit")
            .filter_map(conversions::open_order_from_wire)
            .collect())
    }
}
