//! Rule-table evaluation with per-instrument cooldown.

use crate::indicators::{
    detect_crossover, momentum, rsi, sma, support_resistance, volume_surge, Crossover,
};
use chrono::{DateTime, Duration, Utc};
use common::{BotConfig, Confidence, InstrumentConfig, OptionKind, PriceSeries, Signal,
    TradeDirection};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Minimum bars required before any rule is evaluated
pub const MIN_BARS: usize = 50;

/// Minimum gap in minutes between two emitted signals for the same instrument
pub const COOLDOWN_MINUTES: i64 = 10;

const RSI_PERIOD: usize = 14;
const SHORT_MA: usize = 5;
const LONG_MA: usize = 20;
const SR_PERIOD: usize = 20;

/// Evaluates the rule table for one instrument at a time.
///
/// Owns the cooldown map (instrument key -> last emitted signal time);
/// process-lifetime state, reset only on restart. The timestamp is bumped
/// only when a signal is actually produced, so a quiet instrument is
/// re-evaluated every cycle.
pub struct SignalEngine {
    rsi_oversold: f64,
    rsi_overbought: f64,
    target_profit_percent: f64,
    stop_loss_percent: f64,
    last_signal_time: HashMap<String, DateTime<Utc>>,
}

impl SignalEngine {
    pub fn new(config: &BotConfig) -> Self {
        Self {
            rsi_oversold: config.rsi_oversold,
            rsi_overbought: config.rsi_overbought,
            target_profit_percent: config.target_profit_percent,
            stop_loss_percent: config.stop_loss_percent,
            last_signal_time: HashMap::new(),
        }
    }

    /// Apply the rule table to a fresh series. Returns at most one signal;
    /// `None` covers the cooldown gate, thin series, undefined indicators
    /// and the no-rule-fired case alike.
    pub fn evaluate(
        &mut self,
        instrument: &InstrumentConfig,
        series: &PriceSeries,
        now: DateTime<Utc>,
    ) -> Option<Signal> {
        // Cooldown gate comes before any computation
        if let Some(last) = self.last_signal_time.get(&instrument.key) {
            if now.signed_duration_since(*last) < Duration::minutes(COOLDOWN_MINUTES) {
                debug!("{} still cooling down, skipping", instrument.key);
                return None;
            }
        }

        if series.len() < MIN_BARS {
            debug!(
                "{}: only {} bars, need {}",
                instrument.key,
                series.len(),
                MIN_BARS
            );
            return None;
        }

        let current_rsi = rsi(series, RSI_PERIOD)?;
        let closes = series.closes();
        let short_ma = sma(&closes, SHORT_MA);
        let long_ma = sma(&closes, LONG_MA);
        let crossover = detect_crossover(&short_ma, &long_ma);
        let momentum = momentum(series);
        let (support, resistance) = support_resistance(series, SR_PERIOD)?;
        let price = series.last_close()?;
        let surge = volume_surge(series);

        // Strict priority order; the first rule that fires wins
        let (direction, option_kind, confidence, reason) = if current_rsi < self.rsi_oversold
            && (crossover == Crossover::GoldenCross || momentum > 0.5)
        {
            (
                TradeDirection::Buy,
                OptionKind::Call,
                Confidence::High,
                format!("RSI oversold ({current_rsi:.1}) + Bullish momentum"),
            )
        } else if current_rsi < 40.0 && price <= support * 1.01 {
            (
                TradeDirection::Buy,
                OptionKind::Call,
                Confidence::Medium,
                format!("Near support level + RSI low ({current_rsi:.1})"),
            )
        } else if current_rsi > self.rsi_overbought
            && (crossover == Crossover::DeathCross || momentum < -0.5)
        {
            (
                TradeDirection::Sell,
                OptionKind::Put,
                Confidence::High,
                format!("RSI overbought ({current_rsi:.1}) + Bearish momentum"),
            )
        } else if current_rsi > 60.0 && price >= resistance * 0.99 {
            (
                TradeDirection::Sell,
                OptionKind::Put,
                Confidence::Medium,
                format!("Near resistance level + RSI high ({current_rsi:.1})"),
            )
        } else if surge && momentum.abs() > 1.0 {
            let direction = if momentum > 0.0 {
                TradeDirection::Buy
            } else {
                TradeDirection::Sell
            };
            let option_kind = if momentum > 0.0 {
                OptionKind::Call
            } else {
                OptionKind::Put
            };
            (
                direction,
                option_kind,
                Confidence::Medium,
                format!("Volume surge + {:.1}% price move", momentum.abs()),
            )
        } else {
            return None;
        };

        let signal = Signal {
            id: Uuid::new_v4(),
            instrument: instrument.key.clone(),
            direction,
            option_kind,
            current_price: price,
            strike_price: nearest_strike(price, instrument.strike_step),
            target_price: target_for(direction, price, self.target_profit_percent),
            stop_loss: stop_for(direction, price, self.stop_loss_percent),
            quantity: instrument.lot_size,
            confidence,
            reason,
            created_at: now,
        };

        self.last_signal_time.insert(instrument.key.clone(), now);
        Some(signal)
    }
}

fn nearest_strike(price: f64, strike_step: f64) -> f64 {
    (price / strike_step).round() * strike_step
}

/// Target is on the profitable side of entry: above for Buy, below for
/// Sell, so the ledger's mirrored exit comparisons line up.
fn target_for(direction: TradeDirection, price: f64, percent: f64) -> f64 {
    match direction {
        TradeDirection::Buy => price * (1.0 + percent / 100.0),
        TradeDirection::Sell => price * (1.0 - percent / 100.0),
    }
}

fn stop_for(direction: TradeDirection, price: f64, percent: f64) -> f64 {
    match direction {
        TradeDirection::Buy => price * (1.0 - percent / 100.0),
        TradeDirection::Sell => price * (1.0 + percent / 100.0),
    }
}
