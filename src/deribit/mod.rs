pub mod account;
pub mod auth;
pub mod builder;
pub mod conversions;
pub mod market_data;
pub mod session;
pub mod trading;
pub mod types;

// Re-export main types for easier importing
pub use builder::DeribitSessionBuilder;
pub use session::DeribitSession;
