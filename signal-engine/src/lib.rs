// Signal Engine
// Computes technical indicators over a price series and applies a fixed
// rule table to produce at most one trade recommendation per instrument
// per evaluation, subject to a per-instrument cooldown.

pub mod engine;
pub mod indicators;

pub use engine::{SignalEngine, COOLDOWN_MINUTES, MIN_BARS};
pub use indicators::{
    detect_crossover, momentum, rsi, sma, support_resistance, volume_surge, Crossover,
};
