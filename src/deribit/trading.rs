use crate::core::errors::SessionError;
use crate::core::kernel::WsTransport;
use crate::core::types::{CancelResult, OrderRequest, OrderSide, OrderType, TradeRecord};
use crate::deribit::conversions;
use crate::deribit::session::DeribitSession;
use crate::deribit::types::{OrderInfo, OrderPlacement};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use tracing::{instrument, warn};

impl<T: WsTransport> DeribitSession<T> {
    /// Place a buy order. Inputs are validated locally; a validation
    /// failure never reaches the exchange.
    #[instrument(skip(self))]
    pub async fn buy(
        &self,
        instrument: &str,
        amount: &str,
        order_type: OrderType,
        price: Option<&str>,
    ) -> Result<TradeRecord, SessionError> {
        self.place_order(OrderSide::Buy, instrument, amount, order_type, price)
            .await
    }

    /// Place a sell order.
    #[instrument(skip(self))]
    pub async fn sell(
        &self,
        instrument: &str,
        amount: &str,
        order_type: OrderType,
        price: Option<&str>,
    ) -> Result<TradeRecord, SessionError> {
        self.place_order(OrderSide::Sell, instrument, amount, order_type, price)
            .await
    }

    async fn place_order(
        &self,
        side: OrderSide,
        instrument: &str,
        amount: &str,
        order_type: OrderType,
        price: Option<&str>,
    ) -> Result<TradeRecord, SessionError> {
        let order =
            OrderRequest::from_input(side, instrument, amount, order_type, price, next_label(side))?;
        let params = order_params(&order)?;

        let method = match side {
            OrderSide::Buy => "private/buy",
            OrderSide::Sell => "private/sell",
        };

        let result = self.private_call(method, params).await?;
        let placement: OrderPlacement = serde_json::from_value(result)
            .map_err(|e| SessionError::Protocol(format!("malformed order result: {}", e)))?;

        let record = conversions::trade_record_from_placement(&placement);

        // The exchange-side effect is irreversible from here: a store
        // failure is reported but never rolls back or retries the trade.
        if let Some(store) = self.store() {
            if let Err(e) = store.save(&record).await {
                warn!(order_id = %record.order_id, "failed to persist trade record: {}", e);
            }
        }

        Ok(record)
    }

    /// Cancel an open order by id. Exchange rejections (already filled,
    /// unknown id) surface as `Exchange` errors and are not retried.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: &str) -> Result<CancelResult, SessionError> {
        let result = self
            .private_call("private/cancel", json!({ "order_id": order_id }))
            .await?;

        let order: OrderInfo = serde_json::from_value(result)
            .map_err(|e| SessionError::Protocol(format!("malformed cancel result: {}", e)))?;

        Ok(conversions::cancel_result_from_order(&order))
    }
}

/// Build the `private/buy`/`private/sell` parameter envelope. Amounts and
/// prices go out as JSON numbers; `price` is present iff the order is a
/// limit order.
fn order_params(order: &OrderRequest) -> Result<Value, SessionError> {
    let amount = order
        .amount
        .to_f64()
        .ok_or_else(|| SessionError::Validation("amount out of range".to_string()))?;

    let mut params = json!({
        "instrument_name": order.instrument,
        "amount": amount,
        "type": order.order_type.as_str(),
        "label": order.label,
    });

    if let Some(price) = order.price {
        let price = price
            .to_f64()
            .ok_or_else(|| SessionError::Validation("price out of range".to_string()))?;
        params["price"] = json!(price);
    }

    Ok(params)
}

/// Order labels: side prefix plus a process-wide strictly increasing
/// counter seeded from the timestamp. Two orders within the same second
/// still get distinct labels.
fn next_label(side: OrderSide) -> String {
    static SEQ: OnceLock<AtomicU64> = OnceLock::new();
    let seq = SEQ
        .get_or_init(|| AtomicU64::new(chrono::Utc::now().timestamp().unsigned_abs()));
    format!("{}_{}", side.as_str(), seq.fetch_add(1, Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit_order(price: &str) -> OrderRequest {
        OrderRequest::from_input(
            OrderSide::Buy,
            "BTC-PERPETUAL",
            "10",
            OrderType::Limit,
            Some(price),
            next_label(OrderSide::Buy),
        )
        .unwrap()
    }

    #[test]
    fn market_params_have_no_price_key() {
        let order = OrderRequest::from_input(
            OrderSide::Sell,
            "BTC-PERPETUAL",
            "10",
            OrderType::Market,
            None,
            next_label(OrderSide::Sell),
        )
        .unwrap();

        let params = order_params(&order).unwrap();
        assert_eq!(params["amount"], 10.0);
        assert_eq!(params["type"], "market");
        assert!(params.get("price").is_none());
    }

    #[test]
    fn limit_params_carry_the_supplied_price() {
        let params = order_params(&limit_order("64000.5")).unwrap();
        assert_eq!(params["price"], 64000.5);
        assert_eq!(params["type"], "limit");
    }

    #[test]
    fn labels_are_prefixed_and_unique() {
        let a = next_label(OrderSide::Buy);
        let b = next_label(OrderSide::Buy);
        let c = next_label(OrderSide::Sell);

        assert!(a.starts_with("buy_"));
        assert!(c.starts_with("sell_"));
        assert_ne!(a, b);
    }
}
