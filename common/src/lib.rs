//! Shared domain types for the F&O monitoring assistant.
//!
//! Everything that crosses a crate boundary lives here: price series,
//! signals, trades, and the static configuration surface.

mod config;
mod market;
mod signal;
mod trade;

pub use config::{BotConfig, InstrumentConfig, MarketHoursConfig};
pub use market::{Candle, PriceSeries};
pub use signal::{Confidence, OptionKind, Signal, TradeDirection};
pub use trade::{ExitReason, Trade, TradeStatus};

// Re-export so downstream crates agree on the id types
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;
