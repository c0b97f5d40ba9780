use crate::core::types::{
    BookLevel, CancelResult, OpenOrder, OrderBookSnapshot, OrderSide, TradeRecord,
};
use crate::deribit::types::{BookResult, OpenOrderInfo, OrderInfo, OrderPlacement};
use chrono::Utc;
use rust_decimal::Decimal;

/// Build the durable trade record for a successful buy/sell result.
///
/// The recorded price prefers the average fill price; a resting limit
/// order falls back to its limit price, and an unfilled market order
/// (no numeric price at all) records zero.
pub fn trade_record_from_placement(placement: &OrderPlacement) -> TradeRecord {
    let order = &placement.order;

    let price = order
        .average_price
        .or(order.price)
        .or_else(|| placement.trades.first().map(|t| t.price))
        .unwrap_or(Decimal::ZERO);

    TradeRecord {
        order_id: order.order_id.clone(),
        side: order.direction.clone(),
        instrument_name: order.instrument_name.clone(),
        amount: order.amount,
        price,
        order_type: order.order_type.clone(),
        status: order.order_state.clone(),
        executed_at: Utc::now(),
    }
}

pub fn cancel_result_from_order(order: &OrderInfo) -> CancelResult {
    CancelResult {
        order_id: order.order_id.clone(),
        status: order.order_state.clone(),
    }
}

/// Map one exchange-reported open order into the read model. Orders with
/// an unknown direction or no numeric price are dropped.
pub fn open_order_from_wire(info: &OpenOrderInfo) -> Option<OpenOrder> {
    let side = match info.direction.as_str() {
        "buy" => OrderSide::Buy,
        "sell" => OrderSide::Sell,
        _ => return None,
    };

    Some(OpenOrder {
        order_id: info.order_id.clone(),
        instrument: info.instrument_name.clone(),
        side,
        price: info.price?,
        amount: info.amount,
    })
}

pub fn book_snapshot_from_wire(book: BookResult) -> OrderBookSnapshot {
    let level = |(price, amount): (Decimal, Decimal)| BookLevel { price, amount };

    OrderBookSnapshot {
        instrument: book.instrument_name,
        bids: book.bids.into_iter().map(level).collect(),
        asks: book.asks.into_iter().map(level).collect(),
        timestamp: book.timestamp,
    }
}
