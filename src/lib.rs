pub mod core;
pub mod deribit;
pub mod store;

pub use crate::core::config::SessionConfig;
pub use crate::core::errors::{SessionError, StoreError};
pub use crate::core::traits::TradeStore;
pub use crate::core::types::*;
pub use crate::deribit::{DeribitSession, DeribitSessionBuilder};
pub use crate::store::{JsonlTradeStore, MemoryTradeStore};
