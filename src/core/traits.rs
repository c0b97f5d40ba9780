use crate::core::{errors::StoreError, types::TradeRecord};
use async_trait::async_trait;

/// Narrow persistence seam for executed trades.
///
/// Implementations must be safe to call when the underlying sink is
/// unavailable: they report the failure through `StoreError` instead of
/// panicking or blocking the session. Records are append-only and keyed
/// by `order_id`; there is no update or delete path.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Persist one executed trade.
    async fn save(&self, record: &TradeRecord) -> Result<(), StoreError>;

    /// Look up a previously saved trade by its order id.
    async fn find(&self, order_id: &str) -> Result<Option<TradeRecord>, StoreError>;
}
