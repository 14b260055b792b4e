//! Active/closed trade state machine.

use crate::store::{Portfolio, PortfolioStore};
use chrono::Utc;
use common::{ExitReason, Signal, Trade, TradeDirection, TradeStatus};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("maximum concurrent trades reached ({max})")]
    CapacityExceeded { max: usize },
}

/// Derived portfolio figures for notifications
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioSummary {
    pub active_trades: usize,
    pub closed_trades: usize,
    pub total_pnl: f64,
    /// Percent of closed trades with positive pnl, 0 when none closed
    pub win_rate: f64,
}

/// Owns the portfolio. Trades move ACTIVE -> CLOSED and never back; closed
/// trades are history, never deleted. Every mutating operation persists the
/// full portfolio before returning; a failed save is logged and the
/// in-memory state stays authoritative for the rest of the process.
pub struct TradeLedger {
    portfolio: Portfolio,
    store: PortfolioStore,
    max_trades: usize,
}

impl TradeLedger {
    pub fn new(store: PortfolioStore, max_trades: usize) -> Self {
        let portfolio = store.load();
        info!(
            "ledger loaded: {} active, {} closed, total pnl {:.2}",
            portfolio.active_trades.len(),
            portfolio.closed_trades.len(),
            portfolio.total_pnl
        );
        Self {
            portfolio,
            store,
            max_trades,
        }
    }

    /// Open a trade from a confirmed signal. Fails when the active set is
    /// full; the failure leaves state untouched.
    pub fn create(&mut self, signal: &Signal) -> Result<Trade, LedgerError> {
        if self.portfolio.active_trades.len() >= self.max_trades {
            return Err(LedgerError::CapacityExceeded {
                max: self.max_trades,
            });
        }

        let now = Utc::now();
        let id = format!(
            "TRADE_{}_{}",
            now.format("%Y%m%d_%H%M%S"),
            &Uuid::new_v4().simple().to_string()[..6]
        );

        let trade = Trade {
            id: id.clone(),
            instrument: signal.instrument.clone(),
            direction: signal.direction,
            option_kind: signal.option_kind,
            strike_price: signal.strike_price,
            entry_price: signal.current_price,
            target_price: signal.target_price,
            stop_loss: signal.stop_loss,
            quantity: signal.quantity,
            entry_time: now,
            status: TradeStatus::Active,
            confidence: signal.confidence,
            reason: signal.reason.clone(),
            current_price: None,
            pnl_percent: None,
            pnl_amount: None,
            exit_time: None,
            exit_reason: None,
        };

        self.portfolio.active_trades.insert(id, trade.clone());
        self.persist();
        info!("opened {} {} {}", trade.id, trade.instrument, trade.direction);
        Ok(trade)
    }

    /// Mark every active trade with a fresh price to market and close the
    /// ones that hit their target or stop. Target wins a tie. Returns the
    /// trades closed during this call.
    pub fn update_prices(&mut self, prices: &HashMap<String, f64>) -> Vec<Trade> {
        let mut to_close = Vec::new();

        for trade in self.portfolio.active_trades.values_mut() {
            let Some(&price) = prices.get(&trade.instrument) else {
                continue;
            };
            trade.current_price = Some(price);

            let pnl_percent = match trade.direction {
                TradeDirection::Buy => (price - trade.entry_price) / trade.entry_price * 100.0,
                TradeDirection::Sell => (trade.entry_price - price) / trade.entry_price * 100.0,
            };
            trade.pnl_percent = Some(pnl_percent);
            trade.pnl_amount =
                Some(pnl_percent / 100.0 * trade.entry_price * trade.quantity as f64);

            let exit = match trade.direction {
                TradeDirection::Buy if price >= trade.target_price => Some(ExitReason::TargetHit),
                TradeDirection::Buy if price <= trade.stop_loss => Some(ExitReason::StopLossHit),
                TradeDirection::Sell if price <= trade.target_price => Some(ExitReason::TargetHit),
                TradeDirection::Sell if price >= trade.stop_loss => Some(ExitReason::StopLossHit),
                _ => None,
            };
            if let Some(reason) = exit {
                to_close.push((trade.id.clone(), reason));
            }
        }

        let mut closed = Vec::new();
        for (id, reason) in to_close {
            if let Some(trade) = self.close_in_memory(&id, reason) {
                closed.push(trade);
            }
        }

        // One write covers the whole pass, mark-to-market and closures alike
        self.persist();
        closed
    }

    /// Move a trade from the active set to the closure history, freezing
    /// its pnl contribution. `None` when the id is not active.
    pub fn close(&mut self, trade_id: &str, reason: ExitReason) -> Option<Trade> {
        let trade = self.close_in_memory(trade_id, reason)?;
        self.persist();
        Some(trade)
    }

    fn close_in_memory(&mut self, trade_id: &str, reason: ExitReason) -> Option<Trade> {
        let mut trade = self.portfolio.active_trades.remove(trade_id)?;
        trade.status = TradeStatus::Closed;
        trade.exit_time = Some(Utc::now());
        trade.exit_reason = Some(reason);

        if let Some(pnl) = trade.pnl_amount {
            self.portfolio.total_pnl += pnl;
        }

        self.portfolio.closed_trades.push(trade.clone());
        info!("closed {} ({reason})", trade.id);
        Some(trade)
    }

    pub fn summary(&self) -> PortfolioSummary {
        let closed = self.portfolio.closed_trades.len();
        let winners = self
            .portfolio
            .closed_trades
            .iter()
            .filter(|t| t.pnl_percent.unwrap_or(0.0) > 0.0)
            .count();
        PortfolioSummary {
            active_trades: self.portfolio.active_trades.len(),
            closed_trades: closed,
            total_pnl: self.portfolio.total_pnl,
            win_rate: if closed > 0 {
                winners as f64 / closed as f64 * 100.0
            } else {
                0.0
            },
        }
    }

    pub fn active_trades(&self) -> &HashMap<String, Trade> {
        &self.portfolio.active_trades
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    fn persist(&self) {
        // At-least-once durability attempt: a failed save never rolls back
        // the in-memory mutation
        if let Err(e) = self.store.save(&self.portfolio) {
            error!("failed to persist portfolio: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::{Confidence, OptionKind, Uuid};

    fn signal(instrument: &str, direction: TradeDirection, entry: f64) -> Signal {
        let (target, stop) = match direction {
            TradeDirection::Buy => (entry * 1.01, entry * 0.995),
            TradeDirection::Sell => (entry * 0.99, entry * 1.005),
        };
        Signal {
            id: Uuid::new_v4(),
            instrument: instrument.to_string(),
            direction,
            option_kind: match direction {
                TradeDirection::Buy => OptionKind::Call,
                TradeDirection::Sell => OptionKind::Put,
            },
            current_price: entry,
            strike_price: entry,
            target_price: target,
            stop_loss: stop,
            quantity: 50,
            confidence: Confidence::High,
            reason: "test".to_string(),
            created_at: chrono::Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    fn ledger(max_trades: usize) -> (TradeLedger, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = PortfolioStore::new(dir.path().join("portfolio.json"));
        (TradeLedger::new(store, max_trades), dir)
    }

    fn prices(instrument: &str, price: f64) -> HashMap<String, f64> {
        HashMap::from([(instrument.to_string(), price)])
    }

    #[test]
    fn create_copies_signal_fields() {
        let (mut ledger, _dir) = ledger(3);
        let trade = ledger
            .create(&signal("NIFTY50", TradeDirection::Buy, 24_000.0))
            .unwrap();

        assert_eq!(trade.instrument, "NIFTY50");
        assert_eq!(trade.entry_price, 24_000.0);
        assert_eq!(trade.quantity, 50);
        assert_eq!(trade.status, TradeStatus::Active);
        assert!(trade.id.starts_with("TRADE_"));
        assert!(trade.current_price.is_none());
        assert_eq!(ledger.active_trades().len(), 1);
    }

    #[test]
    fn capacity_limit_rejects_fourth_trade() {
        let (mut ledger, _dir) = ledger(3);
        for i in 0..3 {
            ledger
                .create(&signal("NIFTY50", TradeDirection::Buy, 24_000.0 + i as f64))
                .unwrap();
        }

        let err = ledger
            .create(&signal("BANKNIFTY", TradeDirection::Sell, 51_000.0))
            .unwrap_err();
        assert_eq!(err, LedgerError::CapacityExceeded { max: 3 });
        assert_eq!(ledger.active_trades().len(), 3);
    }

    #[test]
    fn buy_target_hit_closes_with_expected_pnl() {
        let (mut ledger, _dir) = ledger(3);
        // entry 24000 -> target 24240, stop 23880
        ledger
            .create(&signal("NIFTY50", TradeDirection::Buy, 24_000.0))
            .unwrap();

        let closed = ledger.update_prices(&prices("NIFTY50", 24_250.0));
        assert_eq!(closed.len(), 1);
        let trade = &closed[0];
        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.exit_reason, Some(ExitReason::TargetHit));

        let pnl_percent = trade.pnl_percent.unwrap();
        assert!((pnl_percent - 1.0417).abs() < 1e-3);
        let pnl_amount = trade.pnl_amount.unwrap();
        assert!((pnl_amount - pnl_percent / 100.0 * 24_000.0 * 50.0).abs() < 1e-9);
        assert!(ledger.active_trades().is_empty());
    }

    #[test]
    fn buy_stop_loss_closes_with_negative_pnl() {
        let (mut ledger, _dir) = ledger(3);
        ledger
            .create(&signal("NIFTY50", TradeDirection::Buy, 24_000.0))
            .unwrap();

        let closed = ledger.update_prices(&prices("NIFTY50", 23_800.0));
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].exit_reason, Some(ExitReason::StopLossHit));
        assert!(closed[0].pnl_amount.unwrap() < 0.0);
    }

    #[test]
    fn sell_exits_are_mirrored() {
        let (mut ledger, _dir) = ledger(3);
        // entry 1000 -> target 990, stop 1005
        ledger
            .create(&signal("BANKNIFTY", TradeDirection::Sell, 1_000.0))
            .unwrap();

        let closed = ledger.update_prices(&prices("BANKNIFTY", 989.0));
        assert_eq!(closed[0].exit_reason, Some(ExitReason::TargetHit));
        assert!(closed[0].pnl_percent.unwrap() > 0.0);

        ledger
            .create(&signal("BANKNIFTY", TradeDirection::Sell, 1_000.0))
            .unwrap();
        let closed = ledger.update_prices(&prices("BANKNIFTY", 1_006.0));
        assert_eq!(closed[0].exit_reason, Some(ExitReason::StopLossHit));
        assert!(closed[0].pnl_percent.unwrap() < 0.0);
    }

    #[test]
    fn target_wins_exact_tie() {
        let (mut ledger, _dir) = ledger(3);
        let mut sig = signal("NIFTY50", TradeDirection::Buy, 24_000.0);
        sig.target_price = 24_240.0;
        sig.stop_loss = 23_880.0;
        ledger.create(&sig).unwrap();
        let closed = ledger.update_prices(&prices("NIFTY50", 24_240.0));
        assert_eq!(closed[0].exit_reason, Some(ExitReason::TargetHit));
    }

    #[test]
    fn in_range_price_refreshes_mark_to_market_only() {
        let (mut ledger, _dir) = ledger(3);
        ledger
            .create(&signal("NIFTY50", TradeDirection::Buy, 24_000.0))
            .unwrap();

        let closed = ledger.update_prices(&prices("NIFTY50", 24_100.0));
        assert!(closed.is_empty());
        let trade = ledger.active_trades().values().next().unwrap();
        assert_eq!(trade.status, TradeStatus::Active);
        assert_eq!(trade.current_price, Some(24_100.0));
        assert!(trade.pnl_percent.unwrap() > 0.0);
    }

    #[test]
    fn unknown_instrument_prices_are_ignored() {
        let (mut ledger, _dir) = ledger(3);
        ledger
            .create(&signal("NIFTY50", TradeDirection::Buy, 24_000.0))
            .unwrap();
        let closed = ledger.update_prices(&prices("SENSEX", 99_999.0));
        assert!(closed.is_empty());
        let trade = ledger.active_trades().values().next().unwrap();
        assert!(trade.current_price.is_none());
    }

    #[test]
    fn close_is_noop_for_unknown_id() {
        let (mut ledger, _dir) = ledger(3);
        assert!(ledger.close("TRADE_NOPE", ExitReason::Manual).is_none());
    }

    #[test]
    fn total_pnl_freezes_at_closure() {
        let (mut ledger, _dir) = ledger(3);
        ledger
            .create(&signal("NIFTY50", TradeDirection::Buy, 24_000.0))
            .unwrap();
        let closed = ledger.update_prices(&prices("NIFTY50", 24_250.0));
        let frozen = closed[0].pnl_amount.unwrap();

        let summary = ledger.summary();
        assert!((summary.total_pnl - frozen).abs() < 1e-9);
        assert_eq!(summary.closed_trades, 1);
        assert_eq!(summary.active_trades, 0);
        assert_eq!(summary.win_rate, 100.0);
    }

    #[test]
    fn win_rate_counts_profitable_closures() {
        let (mut ledger, _dir) = ledger(3);

        ledger
            .create(&signal("NIFTY50", TradeDirection::Buy, 24_000.0))
            .unwrap();
        ledger.update_prices(&prices("NIFTY50", 24_250.0)); // winner

        ledger
            .create(&signal("NIFTY50", TradeDirection::Buy, 24_000.0))
            .unwrap();
        ledger.update_prices(&prices("NIFTY50", 23_800.0)); // loser

        let summary = ledger.summary();
        assert_eq!(summary.closed_trades, 2);
        assert_eq!(summary.win_rate, 50.0);
    }

    #[test]
    fn summary_with_no_closures_has_zero_win_rate() {
        let (ledger, _dir) = ledger(3);
        assert_eq!(ledger.summary().win_rate, 0.0);
    }

    #[test]
    fn manual_close_is_durable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.json");

        let mut ledger = TradeLedger::new(PortfolioStore::new(&path), 3);
        let trade = ledger
            .create(&signal("NIFTY50", TradeDirection::Buy, 24_000.0))
            .unwrap();
        ledger.close(&trade.id, ExitReason::Manual).unwrap();

        let reloaded = TradeLedger::new(PortfolioStore::new(&path), 3);
        assert!(reloaded.active_trades().is_empty());
        assert_eq!(reloaded.portfolio().closed_trades.len(), 1);
        assert_eq!(
            reloaded.portfolio().closed_trades[0].exit_reason,
            Some(ExitReason::Manual)
        );
    }

    #[test]
    fn state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.json");

        let mut ledger = TradeLedger::new(PortfolioStore::new(&path), 3);
        ledger
            .create(&signal("NIFTY50", TradeDirection::Buy, 24_000.0))
            .unwrap();
        ledger.update_prices(&prices("NIFTY50", 24_250.0));
        let saved = ledger.portfolio().clone();

        let reloaded = TradeLedger::new(PortfolioStore::new(&path), 3);
        assert_eq!(*reloaded.portfolio(), saved);
    }
}
