//! Static configuration surface.
//!
//! Everything here is fixed for the lifetime of the process. A `sentinel.toml`
//! next to the binary overrides the defaults; Telegram credentials stay in
//! the environment and are not part of this file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// One monitored index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Canonical key, e.g. "NIFTY50"
    pub key: String,
    /// Data-source ticker, e.g. "^NSEI"
    pub ticker: String,
    /// Display name for notifications
    pub name: String,
    pub lot_size: u32,
    pub strike_step: f64,
}

/// Exchange clock-time window (IST)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketHoursConfig {
    pub open_hour: u32,
    pub open_minute: u32,
    pub close_hour: u32,
    pub close_minute: u32,
}

impl Default for MarketHoursConfig {
    fn default() -> Self {
        Self {
            open_hour: 9,
            open_minute: 15,
            close_hour: 15,
            close_minute: 30,
        }
    }
}

/// Full bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_rsi_oversold")]
    pub rsi_oversold: f64,
    #[serde(default = "default_rsi_overbought")]
    pub rsi_overbought: f64,
    /// Target profit, percent of entry
    #[serde(default = "default_target_profit")]
    pub target_profit_percent: f64,
    /// Stop loss, percent of entry
    #[serde(default = "default_stop_loss")]
    pub stop_loss_percent: f64,
    #[serde(default = "default_max_trades")]
    pub max_trades: usize,
    #[serde(default = "default_analysis_interval")]
    pub analysis_interval_secs: u64,
    #[serde(default)]
    pub market_hours: MarketHoursConfig,
    #[serde(default = "default_instruments")]
    pub instruments: Vec<InstrumentConfig>,
    /// Any of these substrings marks an inbound reply as a confirmation
    #[serde(default = "default_confirmation_keywords")]
    pub confirmation_keywords: Vec<String>,
    /// Ordered alias -> canonical instrument key pairs; order matters
    /// because matching is first-substring-wins ("banknifty" must be
    /// checked before "nifty")
    #[serde(default = "default_instrument_aliases")]
    pub instrument_aliases: Vec<(String, String)>,
    /// Alias -> option kind ("CALL"/"PUT") pairs
    #[serde(default = "default_option_aliases")]
    pub option_aliases: Vec<(String, String)>,
    #[serde(default = "default_portfolio_file")]
    pub portfolio_file: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            rsi_oversold: default_rsi_oversold(),
            rsi_overbought: default_rsi_overbought(),
            target_profit_percent: default_target_profit(),
            stop_loss_percent: default_stop_loss(),
            max_trades: default_max_trades(),
            analysis_interval_secs: default_analysis_interval(),
            market_hours: MarketHoursConfig::default(),
            instruments: default_instruments(),
            confirmation_keywords: default_confirmation_keywords(),
            instrument_aliases: default_instrument_aliases(),
            option_aliases: default_option_aliases(),
            portfolio_file: default_portfolio_file(),
        }
    }
}

impl BotConfig {
    /// Load from a TOML file, falling back to defaults when the file is
    /// absent. A present-but-unparseable file is an error, not a fallback.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: BotConfig =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn instrument(&self, key: &str) -> Option<&InstrumentConfig> {
        self.instruments.iter().find(|i| i.key == key)
    }
}

fn default_rsi_oversold() -> f64 {
    30.0
}

fn default_rsi_overbought() -> f64 {
    70.0
}

fn default_target_profit() -> f64 {
    1.0
}

fn default_stop_loss() -> f64 {
    0.5
}

fn default_max_trades() -> usize {
    3
}

fn default_analysis_interval() -> u64 {
    300
}

fn default_portfolio_file() -> String {
    "portfolio.json".to_string()
}

fn default_instruments() -> Vec<InstrumentConfig> {
    vec![
        InstrumentConfig {
            key: "SENSEX".to_string(),
            ticker: "^BSESN".to_string(),
            name: "SENSEX".to_string(),
            lot_size: 10,
            strike_step: 100.0,
        },
        InstrumentConfig {
            key: "NIFTY50".to_string(),
            ticker: "^NSEI".to_string(),
            name: "NIFTY50".to_string(),
            lot_size: 50,
            strike_step: 50.0,
        },
        InstrumentConfig {
            key: "BANKNIFTY".to_string(),
            ticker: "^NSEBANK".to_string(),
            name: "BANKNIFTY".to_string(),
            lot_size: 15,
            strike_step: 100.0,
        },
    ]
}

fn default_confirmation_keywords() -> Vec<String> {
    [
        "yes", "ok", "okay", "kk", "oo", "go", "do it", "execute", "buy", "sell", "confirm",
        "approve", "agree", "accept", "go ahead", "proceed", "let's go", "yep", "yup", "ya",
        "sure", "fine", "cool", "nice", "do", "k", "alright", "certainly", "absolutely",
        "definitely", "positive", "affirmative",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_instrument_aliases() -> Vec<(String, String)> {
    [
        ("banknifty", "BANKNIFTY"),
        ("bnf", "BANKNIFTY"),
        ("bank", "BANKNIFTY"),
        ("nifty", "NIFTY50"),
        ("nifty50", "NIFTY50"),
        ("nf", "NIFTY50"),
        ("sensex", "SENSEX"),
        ("bse", "SENSEX"),
    ]
    .iter()
    .map(|(a, c)| (a.to_string(), c.to_string()))
    .collect()
}

fn default_option_aliases() -> Vec<(String, String)> {
    [("call", "CALL"), ("ce", "CALL"), ("put", "PUT"), ("pe", "PUT")]
        .iter()
        .map(|(a, c)| (a.to_string(), c.to_string()))
        .collect()
}
