use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Result payload of `public/auth`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResult {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Result payload of `private/buy` and `private/sell`: the resting or
/// filled order plus any immediate fills.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderPlacement {
    pub order: OrderInfo,
    #[serde(default)]
    pub trades: Vec<TradeFill>,
}

/// An order as reported by the exchange. Also the result payload of
/// `private/cancel`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderInfo {
    pub order_id: String,
    pub direction: String,
    pub instrument_name: String,
    pub amount: Decimal,
    /// `"market_price"` before a market order fills, a number otherwise.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub average_price: Option<Decimal>,
    pub order_type: String,
    pub order_state: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// One fill reported alongside a placed order.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeFill {
    pub trade_id: String,
    pub price: Decimal,
    pub amount: Decimal,
    #[serde(default)]
    pub fee: Option<Decimal>,
}

/// One entry of `private/get_open_orders_by_currency`.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenOrderInfo {
    pub order_id: String,
    pub direction: String,
    pub instrument_name: String,
    pub amount: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
    pub order_type: String,
    #[serde(default)]
    pub order_state: Option<String>,
}

/// Result payload of `public/get_order_book`. Levels arrive as
/// `[price, amount]` pairs.
#[derive(Debug, Clone, Deserialize)]
pub struct BookResult {
    pub instrument_name: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub bids: Vec<(Decimal, Decimal)>,
    #[serde(default)]
    pub asks: Vec<(Decimal, Decimal)>,
}

/// Accept a decimal from a number or numeric string; non-numeric strings
/// (the `"market_price"` sentinel) and null decode as `None`.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed: Option<Decimal> = match value {
        Some(Value::Number(n)) => n.to_string().parse().ok(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    };
    Ok(parsed.map(|d| d.normalize()))
}
