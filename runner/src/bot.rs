//! Orchestration loop.
//!
//! One strictly sequential analysis cycle at a time: evaluate signals,
//! process confirmations, mark trades to market, notify. Collaborator
//! failures degrade the cycle (skip the instrument, drop the poll), they
//! never abort the process; a failed cycle is reported to the chat and the
//! loop moves on.

use crate::market_hours::{format_ist, now_ist, MarketHours};
use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use common::BotConfig;
use market_data::MarketDataSource;
use signal_engine::SignalEngine;
use std::collections::HashMap;
use std::time::Duration;
use telegram_bridge::{format, PendingSignals, ReplyParser, TelegramClient};
use tokio::time::sleep;
use trade_ledger::{PortfolioStore, TradeLedger};
use tracing::{error, info, warn};

pub struct SentinelBot {
    config: BotConfig,
    market: Box<dyn MarketDataSource>,
    engine: SignalEngine,
    ledger: TradeLedger,
    telegram: TelegramClient,
    parser: ReplyParser,
    pending: PendingSignals,
    hours: MarketHours,
    last_summary: chrono::DateTime<Utc>,
}

impl SentinelBot {
    pub fn new(
        config: BotConfig,
        market: Box<dyn MarketDataSource>,
        telegram: TelegramClient,
    ) -> Result<Self> {
        let engine = SignalEngine::new(&config);
        let ledger = TradeLedger::new(PortfolioStore::new(&config.portfolio_file), config.max_trades);
        let parser = ReplyParser::new(&config);
        let hours = MarketHours::new(&config.market_hours)?;
        Ok(Self {
            config,
            market,
            engine,
            ledger,
            telegram,
            parser,
            pending: PendingSignals::new(),
            hours,
            last_summary: Utc::now(),
        })
    }

    /// Main loop. Returns after a shutdown request, with the final summary
    /// sent on a best-effort basis.
    pub async fn run(&mut self) -> Result<()> {
        self.notify(&format::startup_message(
            &self.config,
            &now_ist().format("%Y-%m-%d %H:%M:%S IST").to_string(),
        ))
        .await;
        info!("bot started, monitoring {} instruments", self.config.instruments.len());

        loop {
            if !self.hours.is_open(Utc::now()) {
                if !self.wait_for_market_open().await {
                    break;
                }
            }

            if let Err(e) = self.run_cycle().await {
                error!("analysis cycle failed: {e:#}");
                self.notify(&format::cycle_error_message(&format!("{e:#}"))).await;
            }

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested");
                    break;
                }
                _ = sleep(Duration::from_secs(self.config.analysis_interval_secs)) => {}
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Park until the next session, polling confirmations once a minute so
    /// replies sent after hours still open trades. Returns false when a
    /// shutdown request interrupted the wait.
    async fn wait_for_market_open(&mut self) -> bool {
        let next_open = self.hours.next_open(Utc::now());
        info!("market closed, next open {}", format_ist(next_open));
        self.notify(&format::market_closed_message(&format_ist(next_open))).await;

        while !self.hours.is_open(Utc::now()) {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested while waiting for market open");
                    return false;
                }
                _ = sleep(Duration::from_secs(60)) => {}
            }
            if let Err(e) = self.process_confirmations().await {
                warn!("confirmation poll failed while market closed: {e:#}");
            }
        }
        true
    }

    /// One analysis cycle: signals first, then confirmations, then exits.
    /// Confirmations therefore only ever see signals from this cycle or an
    /// earlier one.
    async fn run_cycle(&mut self) -> Result<()> {
        self.evaluate_signals().await;
        self.process_confirmations().await?;

        let prices = self.fetch_latest_prices().await;
        let closed = self.ledger.update_prices(&prices);
        for trade in &closed {
            info!("trade {} closed: {:?}", trade.id, trade.exit_reason);
            self.notify(&format::trade_closed_message(trade)).await;
        }

        self.maybe_send_summary().await;
        Ok(())
    }

    async fn evaluate_signals(&mut self) {
        let instruments = self.config.instruments.clone();
        for instrument in &instruments {
            let series = match self.market.fetch_series(&instrument.ticker, "5d", "5m").await {
                Ok(series) => series,
                Err(e) => {
                    warn!("no data for {} this cycle: {e:#}", instrument.key);
                    continue;
                }
            };

            if let Some(signal) = self.engine.evaluate(instrument, &series, Utc::now()) {
                info!(
                    "signal: {} {} {} ({})",
                    signal.instrument, signal.direction, signal.option_kind, signal.confidence
                );
                let message = format::signal_message(&signal, &self.config);
                self.pending.push(signal);
                self.notify(&message).await;
            }
        }
    }

    /// Drain new replies and open a trade per matched confirmation. A full
    /// ledger is surfaced to the user and the signal is not retried.
    async fn process_confirmations(&mut self) -> Result<()> {
        let messages = self.telegram.receive_new_messages().await?;
        for message in messages {
            let Some(confirmation) = self.parser.parse(&message.text) else {
                continue;
            };
            let Some(signal) = self.pending.take_match(&confirmation) else {
                info!("confirmation \"{}\" matched no pending signal", message.text);
                continue;
            };

            match self.ledger.create(&signal) {
                Ok(trade) => {
                    info!("trade executed: {}", trade.id);
                    self.notify(&format::trade_executed_message(&trade)).await;
                }
                Err(e) => {
                    warn!("trade execution failed: {e}");
                    self.notify(&format::execution_failed_message(&e.to_string())).await;
                }
            }
        }
        Ok(())
    }

    async fn fetch_latest_prices(&self) -> HashMap<String, f64> {
        let mut prices = HashMap::new();
        for instrument in &self.config.instruments {
            match self.market.fetch_latest_price(&instrument.ticker).await {
                Ok(price) => {
                    prices.insert(instrument.key.clone(), price);
                }
                Err(e) => warn!("no spot price for {}: {e:#}", instrument.key),
            }
        }
        prices
    }

    async fn maybe_send_summary(&mut self) {
        let now = Utc::now();
        if now.signed_duration_since(self.last_summary) < ChronoDuration::hours(1) {
            return;
        }
        self.last_summary = now;
        let summary = self.ledger.summary();
        self.notify(&format::summary_message(
            &summary,
            self.config.max_trades,
            &now_ist().format("%H:%M:%S").to_string(),
        ))
        .await;
        info!("hourly summary sent");
    }

    /// Final summary is best effort; a dead network must not block exit.
    async fn shutdown(&mut self) {
        let summary = self.ledger.summary();
        self.notify(&format::shutdown_message(
            &summary,
            &now_ist().format("%H:%M:%S IST").to_string(),
        ))
        .await;
        info!("bot stopped");
    }

    async fn notify(&self, text: &str) {
        if let Err(e) = self.telegram.send_message(text).await {
            warn!("notification failed: {e:#}");
        }
    }
}
