//! HTML message formatting for the Telegram chat.
//!
//! The layouts (emoji, separators, field order) follow the established
//! chat format so long-time users see familiar messages.

use common::{BotConfig, Confidence, Signal, Trade, TradeDirection};
use trade_ledger::PortfolioSummary;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━";

fn direction_emoji(direction: TradeDirection) -> &'static str {
    match direction {
        TradeDirection::Buy => "🟢",
        TradeDirection::Sell => "🔴",
    }
}

fn confidence_emoji(confidence: Confidence) -> &'static str {
    match confidence {
        Confidence::High => "🔥",
        Confidence::Medium => "⚡",
        Confidence::Low => "💡",
    }
}

/// Trade recommendation awaiting a reply
pub fn signal_message(signal: &Signal, config: &BotConfig) -> String {
    let emoji = direction_emoji(signal.direction);
    format!(
        "{emoji} <b>F&amp;O TRADE RECOMMENDATION</b> {emoji}\n\
         {RULE}\n\
         📍 <b>Instrument:</b> {} {}\n\
         💰 <b>Strike Price:</b> ₹{:.0}\n\
         📊 <b>Action:</b> {}\n\
         💵 <b>Current Price:</b> ₹{:.2}\n\
         🎯 <b>Target:</b> ₹{:.2} ({}%)\n\
         🛑 <b>Stop Loss:</b> ₹{:.2} ({}%)\n\
         📏 <b>Lot Size:</b> {}\n\
         {} <b>Confidence:</b> {}\n\
         📝 <b>Reason:</b> {}\n\
         {RULE}\n\
         <i>Reply with: YES/OK/GO/KK or any confirmation</i>",
        signal.instrument,
        signal.option_kind,
        signal.strike_price,
        signal.direction,
        signal.current_price,
        signal.target_price,
        config.target_profit_percent,
        signal.stop_loss,
        config.stop_loss_percent,
        signal.quantity,
        confidence_emoji(signal.confidence),
        signal.confidence,
        signal.reason,
    )
}

/// Confirmation that a paper trade has been opened
pub fn trade_executed_message(trade: &Trade) -> String {
    format!(
        "✅ <b>TRADE EXECUTED SUCCESSFULLY</b> ✅\n\
         {RULE}\n\
         🆔 <b>Trade ID:</b> {}\n\
         📍 <b>Symbol:</b> {} {}\n\
         💰 <b>Strike:</b> ₹{:.0}\n\
         📊 <b>Type:</b> {}\n\
         💵 <b>Entry:</b> ₹{:.2}\n\
         🎯 <b>Target:</b> ₹{:.2}\n\
         🛑 <b>Stop Loss:</b> ₹{:.2}\n\
         📦 <b>Quantity:</b> {} units\n\
         ⏰ <b>Time:</b> {}\n\
         {RULE}\n\
         <i>Monitoring position for exit...</i>",
        trade.id,
        trade.instrument,
        trade.option_kind,
        trade.strike_price,
        trade.direction,
        trade.entry_price,
        trade.target_price,
        trade.stop_loss,
        trade.quantity,
        trade.entry_time.format("%H:%M:%S"),
    )
}

/// Closure notification with final P&L
pub fn trade_closed_message(trade: &Trade) -> String {
    let pnl = trade.pnl_amount.unwrap_or(0.0);
    let pnl_percent = trade.pnl_percent.unwrap_or(0.0);
    let (emoji, status) = if pnl >= 0.0 {
        ("🟢", "PROFIT")
    } else {
        ("🔴", "LOSS")
    };
    let reason = trade
        .exit_reason
        .map(|r| r.to_string())
        .unwrap_or_else(|| "MANUAL".to_string());

    format!(
        "{emoji} <b>TRADE CLOSED - {reason}</b> {emoji}\n\
         {RULE}\n\
         🆔 <b>Trade ID:</b> {}\n\
         📍 <b>Symbol:</b> {} {}\n\
         💵 <b>Entry:</b> ₹{:.2}\n\
         💰 <b>Exit:</b> ₹{:.2}\n\
         {RULE}\n\
         💹 <b>P&amp;L:</b> ₹{pnl:.2}\n\
         📊 <b>Return:</b> {pnl_percent:+.2}%\n\
         🏆 <b>Status:</b> {status}\n\
         {RULE}",
        trade.id,
        trade.instrument,
        trade.option_kind,
        trade.entry_price,
        trade.current_price.unwrap_or(trade.entry_price),
    )
}

pub fn summary_message(summary: &PortfolioSummary, max_trades: usize, now_ist: &str) -> String {
    format!(
        "📊 <b>PORTFOLIO SUMMARY</b> 📊\n\
         {RULE}\n\
         📈 <b>Active Trades:</b> {}/{max_trades}\n\
         ✅ <b>Closed Trades:</b> {}\n\
         💰 <b>Total P&amp;L:</b> ₹{:.2}\n\
         🎯 <b>Win Rate:</b> {:.1}%\n\
         ⏰ <b>Updated:</b> {now_ist}\n\
         {RULE}",
        summary.active_trades, summary.closed_trades, summary.total_pnl, summary.win_rate,
    )
}

pub fn startup_message(config: &BotConfig, now_ist: &str) -> String {
    let watched: Vec<&str> = config.instruments.iter().map(|i| i.name.as_str()).collect();
    format!(
        "🚀 <b>SENTINEL BOT STARTED</b> 🚀\n\
         {RULE}\n\
         📊 <b>Monitoring:</b> {}\n\
         ⚙️ <b>Settings:</b>\n\
         • Target: {}%\n\
         • Stop Loss: {}%\n\
         • Max Trades: {}\n\
         • RSI Levels: {}/{}\n\
         🕒 <b>Time:</b> {now_ist}\n\
         {RULE}\n\
         <i>Ready to analyze markets!</i>",
        watched.join(", "),
        config.target_profit_percent,
        config.stop_loss_percent,
        config.max_trades,
        config.rsi_oversold,
        config.rsi_overbought,
    )
}

pub fn market_closed_message(next_open_ist: &str) -> String {
    format!(
        "⏸️ <b>Market Closed</b>\n\
         Next opening: {next_open_ist}\n\
         Bot waiting for market to open..."
    )
}

pub fn execution_failed_message(reason: &str) -> String {
    format!("❌ <b>Trade Execution Failed</b>\n{reason}")
}

pub fn cycle_error_message(reason: &str) -> String {
    // Truncate on a char boundary; byte 200 may fall inside a multibyte sequence.
    let mut end = reason.len().min(200);
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    format!("⚠️ <b>Analysis Error</b>\n{}", &reason[..end])
}

pub fn shutdown_message(summary: &PortfolioSummary, now_ist: &str) -> String {
    format!(
        "🛑 <b>SENTINEL BOT STOPPING</b> 🛑\n\
         {RULE}\n\
         📊 Final Portfolio Summary:\n\
         • Active Trades: {}\n\
         • Total P&amp;L: ₹{:.2}\n\
         • Win Rate: {:.1}%\n\
         {RULE}\n\
         <i>Bot stopped at {now_ist}</i>",
        summary.active_trades, summary.total_pnl, summary.win_rate,
    )
}
