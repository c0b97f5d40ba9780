use crate::core::errors::SessionError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a trading session.
///
/// `Failed` is terminal: a session whose handshake was rejected must be
/// dropped and reconstructed by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Authenticated,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Limit => "limit",
        }
    }

    /// Parse user input like "market" or "LIMIT".
    pub fn parse(s: &str) -> Result<Self, SessionError> {
        match s.trim().to_lowercase().as_str() {
            "market" => Ok(Self::Market),
            "limit" => Ok(Self::Limit),
            other => Err(SessionError::Validation(format!(
                "unknown order type '{}', expected 'market' or 'limit'",
                other
            ))),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a positive decimal out of user input. Rejected locally; never
/// dispatched to the exchange.
pub fn parse_positive_decimal(field: &str, input: &str) -> Result<Decimal, SessionError> {
    let value: Decimal = input
        .trim()
        .parse()
        .map_err(|_| SessionError::Validation(format!("{} '{}' is not a number", field, input)))?;

    if value <= Decimal::ZERO {
        return Err(SessionError::Validation(format!(
            "{} must be positive, got {}",
            field, value
        )));
    }

    Ok(value)
}

/// A validated order, immutable once built. `price` is present iff the
/// order is a limit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub instrument: String,
    pub amount: Decimal,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Option<Decimal>,
    pub label: String,
}

impl OrderRequest {
    /// Build an order from raw user input, validating amount and price.
    pub fn from_input(
        side: OrderSide,
        instrument: &str,
        amount: &str,
        order_type: OrderType,
        price: Option<&str>,
        label: String,
    ) -> Result<Self, SessionError> {
        if instrument.trim().is_empty() {
            return Err(SessionError::Validation(
                "instrument name must not be empty".to_string(),
            ));
        }

        let amount = parse_positive_decimal("amount", amount)?;

        let price = match (order_type, price) {
            (OrderType::Limit, Some(p)) => Some(parse_positive_decimal("price", p)?),
            (OrderType::Limit, None) => {
                return Err(SessionError::Validation(
                    "limit orders require a price".to_string(),
                ));
            }
            (OrderType::Market, _) => None,
        };

        Ok(Self {
            instrument: instrument.trim().to_string(),
            amount,
            side,
            order_type,
            price,
            label,
        })
    }
}

/// A trade as durably recorded after a successful buy/sell.
///
/// Field names follow the persistence schema: one document per executed
/// order, keyed by `order_id`, append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub order_id: String,
    pub side: String,
    pub instrument_name: String,
    pub amount: Decimal,
    pub price: Decimal,
    pub order_type: String,
    pub status: String,
    #[serde(rename = "timestamp", with = "second_precision")]
    pub executed_at: DateTime<Utc>,
}

/// UTC timestamps at second precision, `YYYY-MM-DD HH:MM:SS`.
mod second_precision {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let naive =
            NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)?;
        Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
    }
}

/// Open limit order snapshot entry. Ephemeral read model, recomputed on
/// each query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOrder {
    pub order_id: String,
    pub instrument: String,
    pub side: OrderSide,
    pub price: Decimal,
    pub amount: Decimal,
}

/// Result of a cancel request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelResult {
    pub order_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookLevel {
    pub price: Decimal,
    pub amount: Decimal,
}

/// Point-in-time order book for one instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBookSnapshot {
    pub instrument: String,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    /// Exchange timestamp in milliseconds.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn market_order_carries_no_price() {
        let order = OrderRequest::from_input(
            OrderSide::Buy,
            "BTC-PERPETUAL",
            "10",
            OrderType::Market,
            None,
            "buy_1".to_string(),
        )
        .unwrap();

        assert_eq!(order.amount, dec("10"));
        assert!(order.price.is_none());
    }

    #[test]
    fn limit_order_requires_price() {
        let err = OrderRequest::from_input(
            OrderSide::Sell,
            "BTC-PERPETUAL",
            "10",
            OrderType::Limit,
            None,
            "sell_1".to_string(),
        )
        .unwrap_err();

        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let err = OrderRequest::from_input(
            OrderSide::Buy,
            "BTC-PERPETUAL",
            "-5",
            OrderType::Market,
            None,
            "buy_2".to_string(),
        )
        .unwrap_err();

        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[test]
    fn garbage_price_is_rejected() {
        let err = OrderRequest::from_input(
            OrderSide::Buy,
            "BTC-PERPETUAL",
            "10",
            OrderType::Limit,
            Some("not-a-number"),
            "buy_3".to_string(),
        )
        .unwrap_err();

        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[test]
    fn order_type_parsing_is_case_insensitive() {
        assert_eq!(OrderType::parse(" Market ").unwrap(), OrderType::Market);
        assert_eq!(OrderType::parse("LIMIT").unwrap(), OrderType::Limit);
        assert!(OrderType::parse("stop").is_err());
    }

    #[test]
    fn trade_record_round_trips_with_schema_names() {
        let record = TradeRecord {
            order_id: "ETH-1234".to_string(),
            side: "buy".to_string(),
            instrument_name: "ETH-PERPETUAL".to_string(),
            amount: dec("25"),
            price: dec("1850.5"),
            order_type: "limit".to_string(),
            status: "filled".to_string(),
            executed_at: DateTime::from_naive_utc_and_offset(
                chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
                    .unwrap()
                    .and_hms_opt(12, 30, 45)
                    .unwrap(),
                Utc,
            ),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"instrument_name\":\"ETH-PERPETUAL\""));
        assert!(json.contains("\"timestamp\":\"2024-06-01 12:30:45\""));

        let back: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
