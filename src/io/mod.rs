//! I/O module
//!
//! Adapters between the ledger and the outside world.
//!
//! # Components
//!
//! - `json_store` - Durable account store in a JSON file
//! - `price_feed` - HTTP market-data client
//! - `session_token` - Signed session tokens for the CLI session file
//! - `csv_format` - CSV output for price histories

pub mod csv_format;
pub mod json_store;
pub mod price_feed;
pub mod session_token;

pub use csv_format::write_price_history_csv;
pub use json_store::JsonFileStore;
pub use price_feed::HttpPriceOracle;
pub use session_token::SessionCodec;
