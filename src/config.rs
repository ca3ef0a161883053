use anyhow::Context;
use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::api::{BINANCE_API_BASE, BINANCE_TESTNET_API_BASE};
use crate::error::ConfigError;
use crate::execution::{
    SessionConfig, BINANCE_STREAM_BASE, BINANCE_TESTNET_STREAM_BASE, DEFAULT_WINDOW_CAPACITY,
};
use crate::indicators::{IndicatorConfig, IndicatorEngine};
use crate::strategy::{MomentumStrategy, SignalConfig};

/// Default config file, optional
pub const DEFAULT_CONFIG_FILE: &str = "signalbot.toml";

/// Prefix for environment overrides, e.g. `SIGNALBOT__RISK_FRACTION=0.05`
pub const ENV_PREFIX: &str = "SIGNALBOT";

/// Bot settings
///
/// Layered as: built-in defaults, then the TOML file, then environment.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub risk_fraction: Decimal,
    pub short_ema_period: usize,
    pub long_ema_period: usize,
    pub rsi_period: usize,
    pub rsi_low_threshold: f64,
    pub rsi_upper_threshold: f64,
    pub window_capacity: usize,
    pub execution_timeout_secs: u64,
    pub feed_buffer: usize,
    pub testnet: bool,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub database_url: Option<String>,
    pub rest_url: Option<String>,
    pub stream_url: Option<String>,
}

impl BotConfig {
    /// Load configuration
    ///
    /// # Arguments
    /// * `path` - Config file; a missing file is not an error
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));

        let config = Self::defaults()?
            .add_source(File::from(file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: BotConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("symbol", "BTCUSDT")?
            .set_default("base_asset", "BTC")?
            .set_default("quote_asset", "USDT")?
            .set_default("risk_fraction", "0.1")?
            .set_default("short_ema_period", 5)?
            .set_default("long_ema_period", 20)?
            .set_default("rsi_period", 14)?
            .set_default("rsi_low_threshold", 50.0)?
            .set_default("rsi_upper_threshold", 50.0)?
            .set_default("window_capacity", DEFAULT_WINDOW_CAPACITY as u64)?
            .set_default("execution_timeout_secs", 10)?
            .set_default("feed_buffer", 256)?
            .set_default("testnet", true)?)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &'static str, reason: String| Err(ConfigError::Invalid { key, reason });

        if self.symbol.trim().is_empty() {
            return invalid("symbol", "must not be empty".to_string());
        }
        if self.risk_fraction <= Decimal::ZERO || self.risk_fraction > Decimal::ONE {
            return invalid(
                "risk_fraction",
                format!("{} is outside (0, 1]", self.risk_fraction),
            );
        }
        for (key, period) in [
            ("short_ema_period", self.short_ema_period),
            ("long_ema_period", self.long_ema_period),
            ("rsi_period", self.rsi_period),
        ] {
            if period == 0 {
                return invalid(key, "must be positive".to_string());
            }
        }
        for (key, threshold) in [
            ("rsi_low_threshold", self.rsi_low_threshold),
            ("rsi_upper_threshold", self.rsi_upper_threshold),
        ] {
            if !(0.0..=100.0).contains(&threshold) {
                return invalid(key, format!("{} is outside [0, 100]", threshold));
            }
        }

        let warm_up = IndicatorEngine::new(self.indicator_config()).min_samples();
        if self.window_capacity < warm_up {
            return invalid(
                "window_capacity",
                format!(
                    "{} is smaller than the {} samples the indicators need",
                    self.window_capacity, warm_up
                ),
            );
        }
        if self.execution_timeout_secs == 0 {
            return invalid("execution_timeout_secs", "must be positive".to_string());
        }
        if self.feed_buffer == 0 {
            return invalid("feed_buffer", "must be positive".to_string());
        }

        if self.short_ema_period > self.long_ema_period {
            return invalid(
                "short_ema_period",
                format!(
                    "{} is longer than long_ema_period ({})",
                    self.short_ema_period, self.long_ema_period
                ),
            );
        }
        if self.rsi_period + 1 > self.long_ema_period {
            return invalid(
                "rsi_period",
                format!(
                    "{} needs more than the {} samples long_ema_period warms up with",
                    self.rsi_period, self.long_ema_period
                ),
            );
        }
        if self.short_ema_period == self.long_ema_period {
            tracing::warn!(
                "short_ema_period ({}) equals long_ema_period ({})",
                self.short_ema_period,
                self.long_ema_period
            );
        }

        Ok(())
    }

    pub fn indicator_config(&self) -> IndicatorConfig {
        IndicatorConfig {
            short_period: self.short_ema_period,
            long_period: self.long_ema_period,
            rsi_period: self.rsi_period,
        }
    }

    pub fn signal_config(&self) -> SignalConfig {
        SignalConfig {
            rsi_low_threshold: self.rsi_low_threshold,
            rsi_upper_threshold: self.rsi_upper_threshold,
        }
    }

    pub fn strategy(&self) -> MomentumStrategy {
        MomentumStrategy::new(self.indicator_config(), self.signal_config())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            symbol: self.symbol.clone(),
            risk_fraction: self.risk_fraction,
            execution_timeout: Duration::from_secs(self.execution_timeout_secs),
            window_capacity: self.window_capacity,
        }
    }

    /// REST endpoint, honoring the testnet switch unless overridden
    pub fn rest_url(&self) -> &str {
        match (&self.rest_url, self.testnet) {
            (Some(url), _) => url,
            (None, true) => BINANCE_TESTNET_API_BASE,
            (None, false) => BINANCE_API_BASE,
        }
    }

    /// WebSocket endpoint, honoring the testnet switch unless overridden
    pub fn stream_url(&self) -> &str {
        match (&self.stream_url, self.testnet) {
            (Some(url), _) => url,
            (None, true) => BINANCE_TESTNET_STREAM_BASE,
            (None, false) => BINANCE_STREAM_BASE,
        }
    }
}
