use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::executor::{submit_order, AccountQuery, ExecutionAdapter};
use super::position::Position;
use super::price_window::PriceWindow;
use super::trade_log::TradeLog;
use crate::error::{ExecutionError, TickError};
use crate::models::{Signal, Tick, TradeRecord, TradeSide};
use crate::strategy::MomentumStrategy;

/// Per-session trading parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub symbol: String,
    /// Fraction of available cash committed per entry
    pub risk_fraction: Decimal,
    pub execution_timeout: Duration,
    pub window_capacity: usize,
}

/// What a single feed message led to
#[derive(Debug)]
pub enum TickOutcome {
    /// Not a trade event
    Ignored,
    Malformed(TickError),
    WarmingUp {
        have: usize,
        need: usize,
    },
    Hold,
    Bought(TradeRecord),
    Sold {
        record: TradeRecord,
        roi_pct: Option<Decimal>,
    },
    /// A signal fired but no order was sent
    Skipped {
        signal: Signal,
        reason: String,
    },
    ExecutionFailed {
        side: TradeSide,
        error: ExecutionError,
    },
}

/// Counters reported when the feed ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub messages: u64,
    pub ticks: u64,
    pub malformed: u64,
    pub trades: u64,
    pub failed_orders: u64,
}

/// Serial tick consumer for one symbol
///
/// Owns the price window and the position. Each tick is fully processed,
/// including any order and the resulting position update, before the next
/// one is read.
pub struct TradingSession {
    config: SessionConfig,
    strategy: MomentumStrategy,
    window: PriceWindow,
    position: Position,
    executor: Arc<dyn ExecutionAdapter>,
    trade_log: Arc<dyn TradeLog>,
}

impl TradingSession {
    pub fn new(
        config: SessionConfig,
        strategy: MomentumStrategy,
        starting_balance: Decimal,
        executor: Arc<dyn ExecutionAdapter>,
        trade_log: Arc<dyn TradeLog>,
    ) -> Self {
        let window = PriceWindow::new(config.window_capacity);
        Self {
            config,
            strategy,
            window,
            position: Position::new(starting_balance),
            executor,
            trade_log,
        }
    }

    /// Create a session seeded with the account's free balance of `quote_asset`
    pub async fn start(
        config: SessionConfig,
        strategy: MomentumStrategy,
        account: &dyn AccountQuery,
        quote_asset: &str,
        executor: Arc<dyn ExecutionAdapter>,
        trade_log: Arc<dyn TradeLog>,
    ) -> anyhow::Result<Self> {
        let starting_balance = account.get_balance(quote_asset).await?;

        tracing::info!(
            symbol = %config.symbol,
            "Starting balance: {} {}",
            starting_balance,
            quote_asset
        );

        Ok(Self::new(
            config,
            strategy,
            starting_balance,
            executor,
            trade_log,
        ))
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn window(&self) -> &PriceWindow {
        &self.window
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Consume the feed until it closes
    pub async fn run(&mut self, mut feed: mpsc::Receiver<String>) -> SessionStats {
        let mut stats = SessionStats::default();

        while let Some(raw) = feed.recv().await {
            stats.messages += 1;

            match self.on_message(&raw).await {
                TickOutcome::Ignored => {}
                TickOutcome::Malformed(_) => stats.malformed += 1,
                TickOutcome::Bought(_) | TickOutcome::Sold { .. } => {
                    stats.ticks += 1;
                    stats.trades += 1;
                }
                TickOutcome::ExecutionFailed { .. } => {
                    stats.ticks += 1;
                    stats.failed_orders += 1;
                }
                _ => stats.ticks += 1,
            }
        }

        tracing::info!(
            messages = stats.messages,
            trades = stats.trades,
            failed_orders = stats.failed_orders,
            "Feed closed, session finished"
        );

        stats
    }

    /// Process one raw feed message
    pub async fn on_message(&mut self, raw: &str) -> TickOutcome {
        match Tick::parse(raw) {
            Ok(Some(tick)) => self.on_tick(tick).await,
            Ok(None) => TickOutcome::Ignored,
            Err(e) => {
                tracing::warn!("Skipping feed message: {}", e);
                TickOutcome::Malformed(e)
            }
        }
    }

    /// Process one trade tick
    pub async fn on_tick(&mut self, tick: Tick) -> TickOutcome {
        let sample = match tick.to_sample() {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!("Skipping tick: {}", e);
                return TickOutcome::Malformed(e);
            }
        };

        self.window.append(sample);
        tracing::debug!(
            price = %sample.price,
            timestamp = %sample.timestamp,
            window = self.window.len(),
            "Tick"
        );

        let prices = self.window.prices();
        let (reading, signal) = self.strategy.evaluate(&prices, &self.position);

        if let crate::indicators::IndicatorReading::InsufficientData { have, need } = reading {
            return TickOutcome::WarmingUp { have, need };
        }

        match signal {
            Signal::Buy => self.execute_buy(sample.price).await,
            Signal::Sell => self.execute_sell().await,
            Signal::Hold => TickOutcome::Hold,
        }
    }

    async fn execute_buy(&mut self, last_price: Decimal) -> TickOutcome {
        let quantity = match self
            .position
            .order_quantity(self.config.risk_fraction, last_price)
        {
            Some(q) if q > Decimal::ZERO => q,
            Some(_) => {
                return self.skip(Signal::Buy, "order quantity rounds to zero".to_string());
            }
            None => {
                return self.skip(Signal::Buy, format!("cannot size order at price {}", last_price));
            }
        };

        tracing::info!(
            symbol = %self.config.symbol,
            %quantity,
            %last_price,
            "📈 Buy signal"
        );

        let report = match submit_order(
            self.executor.as_ref(),
            TradeSide::Buy,
            &self.config.symbol,
            quantity,
            self.config.execution_timeout,
        )
        .await
        {
            Ok(report) => report,
            Err(error) => return self.failed(TradeSide::Buy, error),
        };

        let (filled, price) = match self.position.apply_buy(&report) {
            Ok(booked) => booked,
            Err(e) => {
                return self.failed(TradeSide::Buy, ExecutionError::InvalidResponse(e.to_string()))
            }
        };

        tracing::info!(
            "✅ Bought {} {} @ {} (cash: {})",
            filled,
            self.config.symbol,
            price,
            self.position.cash_balance()
        );

        let record = TradeRecord::new(TradeSide::Buy, &self.config.symbol, filled, price);
        self.record_trade(&record).await;
        TickOutcome::Bought(record)
    }

    async fn execute_sell(&mut self) -> TickOutcome {
        let quantity = self.position.quantity_held();

        tracing::info!(
            symbol = %self.config.symbol,
            %quantity,
            "📉 Sell signal"
        );

        let report = match submit_order(
            self.executor.as_ref(),
            TradeSide::Sell,
            &self.config.symbol,
            quantity,
            self.config.execution_timeout,
        )
        .await
        {
            Ok(report) => report,
            Err(error) => return self.failed(TradeSide::Sell, error),
        };

        let (sold, price) = match self.position.apply_sell(&report) {
            Ok(booked) => booked,
            Err(e) => {
                return self.failed(TradeSide::Sell, ExecutionError::InvalidResponse(e.to_string()))
            }
        };

        let roi_pct = self.position.roi_pct();
        tracing::info!(
            "✅ Sold {} {} @ {}",
            sold,
            self.config.symbol,
            price
        );
        match roi_pct {
            Some(roi) => tracing::info!(
                "💰 Total Balance: {:.2}, ROI: {:.2}%",
                self.position.cash_balance(),
                roi
            ),
            None => tracing::info!(
                "💰 Total Balance: {:.2} (ROI undefined for zero starting balance)",
                self.position.cash_balance()
            ),
        }

        let record = TradeRecord::new(TradeSide::Sell, &self.config.symbol, sold, price);
        self.record_trade(&record).await;
        TickOutcome::Sold { record, roi_pct }
    }

    async fn record_trade(&self, record: &TradeRecord) {
        match self.trade_log.append(record).await {
            Ok(()) => tracing::info!(
                side = ?record.side,
                symbol = %record.symbol,
                quantity = %record.quantity,
                price = %record.price,
                "Trade logged"
            ),
            Err(e) => tracing::warn!("Failed to persist trade {}: {}", record.id, e),
        }
    }

    fn skip(&self, signal: Signal, reason: String) -> TickOutcome {
        tracing::warn!("{:?} signal skipped: {}", signal, reason);
        TickOutcome::Skipped { signal, reason }
    }

    fn failed(&self, side: TradeSide, error: ExecutionError) -> TickOutcome {
        tracing::warn!(
            "⚠️  {:?} order for {} failed, position unchanged: {}",
            side,
            self.config.symbol,
            error
        );
        TickOutcome::ExecutionFailed { side, error }
    }
}
