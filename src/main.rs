use anyhow::Context;
use clap::Parser;
use signalbot::api::BinanceClient;
use signalbot::db::PostgresTradeLog;
use signalbot::execution::{BinanceTradeFeed, MemoryTradeLog, TradeLog, TradingSession};
use signalbot::BotConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "signalbot=info";

#[derive(Parser, Debug)]
#[command(name = "signalbot", about = "EMA/RSI momentum trader for a single spot symbol")]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the traded symbol, e.g. ETHUSDT
    #[arg(short, long)]
    symbol: Option<String>,

    /// Log filter directive, overrides RUST_LOG
    #[arg(long)]
    log_filter: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(cli.log_filter.as_deref());

    tracing::info!("🚀 signalbot starting");

    let mut config = BotConfig::load(cli.config.as_deref())?;
    if let Some(symbol) = cli.symbol {
        config.symbol = symbol.to_uppercase();
        config.validate()?;
    }

    log_configuration(&config);

    let client = Arc::new(
        BinanceClient::new(
            config.rest_url(),
            config.api_key.clone(),
            config.api_secret.clone(),
        )
        .context("Failed to create exchange client")?,
    );

    match client.get_symbol_price(&config.symbol).await {
        Ok(price) => tracing::info!("  Current {} price: {}", config.symbol, price),
        Err(e) => tracing::warn!("Could not fetch current price for {}: {}", config.symbol, e),
    }

    let trade_log = connect_trade_log(config.database_url.as_deref()).await;

    let mut session = TradingSession::start(
        config.session_config(),
        config.strategy(),
        client.as_ref(),
        &config.quote_asset,
        client.clone(),
        trade_log,
    )
    .await
    .context("Failed to read starting balance")?;

    let feed = BinanceTradeFeed::new(config.stream_url(), &config.symbol);
    let (messages, reader) = feed.connect(config.feed_buffer).await?;

    tracing::info!("✅ Trading {}. Press Ctrl+C to stop...", config.symbol);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("⚠️  Received Ctrl+C, shutting down...");
        }
        stats = session.run(messages) => {
            tracing::warn!("Trade stream ended: {:?}", stats);
        }
    }

    reader.abort();

    let position = session.position();
    tracing::info!(
        "👋 signalbot stopped. Cash: {} {}, held: {} {}",
        position.cash_balance(),
        config.quote_asset,
        position.quantity_held(),
        config.base_asset
    );
    Ok(())
}

fn setup_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn log_configuration(config: &BotConfig) {
    tracing::info!("📊 Configuration:");
    tracing::info!("  Symbol: {} ({}/{})", config.symbol, config.base_asset, config.quote_asset);
    tracing::info!("  Exchange: {}", if config.testnet { "testnet" } else { "live" });
    tracing::info!("  Risk per trade: {} of cash", config.risk_fraction);
    tracing::info!(
        "  EMA: {}/{}, RSI({}) thresholds {}/{}",
        config.short_ema_period,
        config.long_ema_period,
        config.rsi_period,
        config.rsi_low_threshold,
        config.rsi_upper_threshold
    );
    tracing::info!("  Window: {} samples", config.window_capacity);
    tracing::info!("  Order timeout: {}s", config.execution_timeout_secs);
}

/// Postgres when configured and reachable, otherwise an in-memory log
async fn connect_trade_log(database_url: Option<&str>) -> Arc<dyn TradeLog> {
    let Some(database_url) = database_url else {
        tracing::info!("No database configured, keeping trade history in memory");
        return Arc::new(MemoryTradeLog::new());
    };

    match PostgresTradeLog::new(database_url).await {
        Ok(log) => Arc::new(log),
        Err(e) => {
            tracing::warn!(
                "Failed to connect to Postgres ({:#}), continuing with in-memory trade log",
                e
            );
            Arc::new(MemoryTradeLog::new())
        }
    }
}
