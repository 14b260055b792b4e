use anyhow::{Context, Result};
use bot::SentinelBot;
use common::BotConfig;
use market_data::YahooFinanceClient;
use telegram_bridge::TelegramClient;
use tracing::{info, Level};

mod bot;
mod market_hours;

const CONFIG_FILE: &str = "sentinel.toml";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = BotConfig::load_or_default(CONFIG_FILE)?;

    let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
        .context("TELEGRAM_BOT_TOKEN is not set; put it in the environment or a .env file")?;
    let chat_id = std::env::var("TELEGRAM_CHAT_ID")
        .context("TELEGRAM_CHAT_ID is not set; put it in the environment or a .env file")?;

    let market = Box::new(YahooFinanceClient::new()?);
    let telegram = TelegramClient::new(&bot_token, &chat_id)?;

    info!("starting F&O sentinel bot");
    let mut bot = SentinelBot::new(config, market, telegram)?;
    bot.run().await
}
