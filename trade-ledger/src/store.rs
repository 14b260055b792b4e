//! Whole-document JSON persistence for the portfolio.
//!
//! Single-writer by assumption: one bot process owns the file. The document
//! is rewritten in full after every mutation; there are no incremental
//! writes.

use anyhow::{Context, Result};
use common::Trade;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Durable portfolio state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default)]
    pub active_trades: HashMap<String, Trade>,
    /// Append-only closure history
    #[serde(default)]
    pub closed_trades: Vec<Trade>,
    /// Sum of each closed trade's pnl_amount, frozen at closure
    #[serde(default)]
    pub total_pnl: f64,
}

/// Loads and saves the portfolio document.
pub struct PortfolioStore {
    path: PathBuf,
}

impl PortfolioStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the portfolio from disk. An absent or unparseable file yields
    /// an empty portfolio; startup is never blocked on bad state.
    pub fn load(&self) -> Portfolio {
        if !self.path.exists() {
            info!("no portfolio file at {}, starting empty", self.path.display());
            return Portfolio::default();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(portfolio) => portfolio,
                Err(e) => {
                    warn!(
                        "portfolio file {} is unparseable ({e}), starting empty",
                        self.path.display()
                    );
                    Portfolio::default()
                }
            },
            Err(e) => {
                warn!(
                    "could not read portfolio file {} ({e}), starting empty",
                    self.path.display()
                );
                Portfolio::default()
            }
        }
    }

    /// Rewrite the document, indented for human inspection.
    pub fn save(&self, portfolio: &Portfolio) -> Result<()> {
        let raw = serde_json::to_string_pretty(portfolio).context("serializing portfolio")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("writing {}", self.path.display()))
    }
}
