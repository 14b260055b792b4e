//! Paper trade records

use crate::signal::{Confidence, OptionKind, TradeDirection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Active,
    Closed,
}

/// Why a trade left the active set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    TargetHit,
    StopLossHit,
    Manual,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::TargetHit => write!(f, "TARGET_HIT"),
            ExitReason::StopLossHit => write!(f, "STOP_LOSS_HIT"),
            ExitReason::Manual => write!(f, "MANUAL"),
        }
    }
}

/// A recorded paper position, owned exclusively by the trade ledger.
///
/// Created from a confirmed signal, mutated only on price updates and
/// closure, never deleted - closed trades move to the append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub instrument: String,
    pub direction: TradeDirection,
    pub option_kind: OptionKind,
    pub strike_price: f64,
    pub entry_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    pub quantity: u32,
    pub entry_time: DateTime<Utc>,
    pub status: TradeStatus,
    pub confidence: Confidence,
    pub reason: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub pnl_percent: Option<f64>,
    #[serde(default)]
    pub pnl_amount: Option<f64>,
    #[serde(default)]
    pub exit_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exit_reason: Option<ExitReason>,
}
