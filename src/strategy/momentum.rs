use super::signals::{decide, SignalConfig};
use crate::execution::Position;
use crate::indicators::{IndicatorConfig, IndicatorEngine, IndicatorReading};
use crate::models::Signal;

/// EMA crossover strategy filtered by RSI
///
/// Recomputes the indicators over the whole price window on every call and
/// classifies the result against the current position.
#[derive(Debug, Clone, Default)]
pub struct MomentumStrategy {
    engine: IndicatorEngine,
    config: SignalConfig,
}

impl MomentumStrategy {
    pub fn new(indicators: IndicatorConfig, config: SignalConfig) -> Self {
        Self {
            engine: IndicatorEngine::new(indicators),
            config,
        }
    }

    pub fn name(&self) -> &str {
        "MomentumStrategy"
    }

    /// Samples needed before the strategy can produce anything but Hold
    pub fn min_samples(&self) -> usize {
        self.engine.min_samples()
    }

    pub fn signal_config(&self) -> &SignalConfig {
        &self.config
    }

    /// Evaluate a price series against the current position
    pub fn evaluate(&self, prices: &[f64], position: &Position) -> (IndicatorReading, Signal) {
        let reading = self.engine.compute(prices);

        if let Some(indicators) = reading.indicators() {
            tracing::debug!(
                spread = indicators.spread(),
                rsi = indicators.rsi,
                "Indicators updated"
            );
        }

        let signal = decide(&reading, position, &self.config);
        (reading, signal)
    }
}
