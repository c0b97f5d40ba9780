use thiserror::Error;

/// Errors surfaced by a trading session.
///
/// `Transport` and `Protocol` are fatal: the session must be discarded and
/// reconstructed by the caller. `Validation` and `NotAuthenticated` are
/// rejected locally without a network round trip. `Store` is the one case
/// downgraded to a warning on the trading path: the exchange-side effect
/// already happened and cannot be rolled back from here.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("not authenticated: run authenticate() before private calls")]
    NotAuthenticated,

    #[error("invalid parameters: {0}")]
    Validation(String),

    #[error("exchange error: {code} - {message}")]
    Exchange { code: i64, message: String },

    #[error("trade store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] crate::core::config::ConfigError),
}

/// Errors from the trade record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
