//! Technical indicators.
//!
//! Pure functions over a [`PriceSeries`]. Insufficient data yields `None`
//! (or `0.0` for momentum); callers treat an undefined indicator as
//! "no signal". There are no other error paths.

use common::PriceSeries;

/// Two-bar moving-average transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    GoldenCross,
    DeathCross,
    None,
}

/// Relative Strength Index over the last `period` close-to-close deltas,
/// using a simple rolling mean of gains and losses.
///
/// Needs `period + 1` bars. A window with no losses saturates at 100.
pub fn rsi(series: &PriceSeries, period: usize) -> Option<f64> {
    let closes = series.closes();
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let window = &deltas[deltas.len() - period..];

    let avg_gain: f64 = window.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let avg_loss: f64 = window.iter().filter(|d| **d < 0.0).map(|d| -d).sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Simple moving average series: one value per bar starting at index
/// `period - 1` of the input.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    values
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

/// Classify the most recent two-bar transition of a short MA against a
/// long MA. Both series must have at least two points, otherwise `None`.
///
/// The two inputs are expected to end at the same bar, which holds for
/// [`sma`] outputs computed over the same close series.
pub fn detect_crossover(short: &[f64], long: &[f64]) -> Crossover {
    if short.len() < 2 || long.len() < 2 {
        return Crossover::None;
    }
    let (short_prev, short_now) = (short[short.len() - 2], short[short.len() - 1]);
    let (long_prev, long_now) = (long[long.len() - 2], long[long.len() - 1]);

    if short_prev <= long_prev && short_now > long_now {
        Crossover::GoldenCross
    } else if short_prev >= long_prev && short_now < long_now {
        Crossover::DeathCross
    } else {
        Crossover::None
    }
}

/// Percent change between the last two closes; `0.0` below two bars.
pub fn momentum(series: &PriceSeries) -> f64 {
    let closes = series.closes();
    if closes.len() < 2 {
        return 0.0;
    }
    let prev = closes[closes.len() - 2];
    let last = closes[closes.len() - 1];
    (last - prev) / prev * 100.0
}

/// Rolling `min(low)` / `max(high)` over the trailing `period` bars,
/// returned as `(support, resistance)`.
pub fn support_resistance(series: &PriceSeries, period: usize) -> Option<(f64, f64)> {
    let candles = series.candles();
    if period == 0 || candles.len() < period {
        return None;
    }
    let window = &candles[candles.len() - period..];
    let support = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let resistance = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    Some((support, resistance))
}

/// True when the latest volume exceeds 1.5x the mean volume of the series.
pub fn volume_surge(series: &PriceSeries) -> bool {
    let candles = series.candles();
    let last = match candles.last() {
        Some(c) => c.volume,
        None => return false,
    };
    let mean = candles.iter().map(|c| c.volume).sum::<f64>() / candles.len() as f64;
    last > mean * 1.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::Candle;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let mut series = PriceSeries::default();
        for (i, close) in closes.iter().enumerate() {
            series.push(Candle {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 300, 0).unwrap(),
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                volume: 1000.0,
            });
        }
        series
    }

    #[test]
    fn rsi_needs_period_plus_one_bars() {
        let series = series_from_closes(&[100.0, 101.0]);
        assert!(rsi(&series, 14).is_none());
        assert!(rsi(&series, 0).is_none());
    }

    #[test]
    fn rsi_saturates_without_losses() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes(&closes);
        assert_eq!(rsi(&series, 14), Some(100.0));
    }

    #[test]
    fn rsi_known_value() {
        // deltas: +1.0, -0.5 -> avg gain 0.5, avg loss 0.25, rs = 2
        let series = series_from_closes(&[10.0, 11.0, 10.5]);
        let value = rsi(&series, 2).unwrap();
        assert!((value - 66.6667).abs() < 1e-3);
    }

    #[test]
    fn sma_rolls_over_windows() {
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0], 2), vec![1.5, 2.5, 3.5]);
        assert!(sma(&[1.0], 2).is_empty());
    }

    #[test]
    fn golden_cross_detected() {
        let short = [1.0, 3.0];
        let long = [2.0, 2.0];
        assert_eq!(detect_crossover(&short, &long), Crossover::GoldenCross);
    }

    #[test]
    fn death_cross_detected() {
        let short = [3.0, 1.0];
        let long = [2.0, 2.0];
        assert_eq!(detect_crossover(&short, &long), Crossover::DeathCross);
    }

    #[test]
    fn no_cross_without_transition() {
        let short = [3.0, 4.0];
        let long = [2.0, 2.0];
        assert_eq!(detect_crossover(&short, &long), Crossover::None);
        assert_eq!(detect_crossover(&[1.0], &[2.0, 2.0]), Crossover::None);
    }

    #[test]
    fn momentum_is_last_two_bar_change() {
        let series = series_from_closes(&[100.0, 101.0]);
        assert!((momentum(&series) - 1.0).abs() < 1e-9);
        assert_eq!(momentum(&series_from_closes(&[100.0])), 0.0);
    }

    #[test]
    fn support_resistance_uses_trailing_window() {
        // 25 bars; the low of 50.0 sits outside the trailing 20-bar window
        let mut closes: Vec<f64> = vec![50.0; 5];
        closes.extend((0..20).map(|i| 100.0 + i as f64));
        let series = series_from_closes(&closes);
        let (support, resistance) = support_resistance(&series, 20).unwrap();
        assert_eq!(support, 100.0);
        assert_eq!(resistance, 119.0);
        assert!(support_resistance(&series_from_closes(&[1.0]), 20).is_none());
    }

    #[test]
    fn volume_surge_compares_to_series_mean() {
        let mut series = series_from_closes(&[100.0, 100.0, 100.0]);
        assert!(!volume_surge(&series));
        series.push(Candle {
            timestamp: Utc.timestamp_opt(1_700_100_000, 0).unwrap(),
            open: 100.0,
            high: 100.0,
            low: 100.0,
            close: 100.0,
            volume: 5000.0,
        });
        assert!(volume_surge(&series));
        assert!(!volume_surge(&PriceSeries::default()));
    }
}
