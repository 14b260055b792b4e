//! Trade ledger: the only owner of trade state.
//!
//! Creates trades from confirmed signals, marks them to market on every
//! price tick, evaluates exit conditions and persists the whole portfolio
//! after each mutation.

mod ledger;
mod store;

pub use ledger::{LedgerError, PortfolioSummary, TradeLedger};
pub use store::{Portfolio, PortfolioStore};
