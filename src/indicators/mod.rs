// Technical indicators module
// EMA crossover and RSI over the rolling price window

pub mod moving_average;
pub mod rsi;

pub use moving_average::{calculate_ema, calculate_sma};
pub use rsi::calculate_rsi;

/// Indicator periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorConfig {
    pub short_period: usize,
    pub long_period: usize,
    pub rsi_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            short_period: 5,
            long_period: 20,
            rsi_period: 14,
        }
    }
}

/// Latest value of each indicator for one window snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Indicators {
    pub short_ema: f64,
    pub long_ema: f64,
    pub rsi: f64,
}

impl Indicators {
    /// Short minus long EMA; positive in an uptrend
    pub fn spread(&self) -> f64 {
        self.short_ema - self.long_ema
    }
}

/// Result of evaluating the indicators over a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorReading {
    Ready(Indicators),
    /// Not enough samples yet; callers treat this as Hold
    InsufficientData { have: usize, need: usize },
}

impl IndicatorReading {
    pub fn indicators(&self) -> Option<&Indicators> {
        match self {
            IndicatorReading::Ready(indicators) => Some(indicators),
            IndicatorReading::InsufficientData { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, IndicatorReading::Ready(_))
    }
}

/// Stateless indicator calculator
///
/// Every call recomputes from the full price series it is given,
/// so the same window always produces the same reading.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Number of samples needed before a reading is available
    ///
    /// RSI needs one more price than its period to produce `period` changes.
    /// When `rsi_period < long_period` and `short_period <= long_period` this
    /// is exactly `long_period`; `BotConfig::validate` only admits such periods.
    pub fn min_samples(&self) -> usize {
        self.config
            .long_period
            .max(self.config.short_period)
            .max(self.config.rsi_period + 1)
    }

    /// Compute the indicators over an ordered price series (oldest first)
    pub fn compute(&self, prices: &[f64]) -> IndicatorReading {
        let need = self.min_samples();
        let insufficient = IndicatorReading::InsufficientData {
            have: prices.len(),
            need,
        };

        if prices.len() < need {
            return insufficient;
        }

        let short_ema = calculate_ema(prices, self.config.short_period);
        let long_ema = calculate_ema(prices, self.config.long_period);
        let rsi = calculate_rsi(prices, self.config.rsi_period);

        match (short_ema, long_ema, rsi) {
            (Some(short_ema), Some(long_ema), Some(rsi)) => IndicatorReading::Ready(Indicators {
                short_ema,
                long_ema,
                rsi,
            }),
            // Only reachable with a zero period
            _ => insufficient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(start: f64, len: usize) -> Vec<f64> {
        (0..len).map(|i| start + i as f64).collect()
    }

    #[test]
    fn test_min_samples_default() {
        let engine = IndicatorEngine::default();
        assert_eq!(engine.min_samples(), 20);
    }

    #[test]
    fn test_min_samples_with_long_rsi() {
        let engine = IndicatorEngine::new(IndicatorConfig {
            short_period: 3,
            long_period: 10,
            rsi_period: 14,
        });
        assert_eq!(engine.min_samples(), 15);
    }

    #[test]
    fn test_insufficient_data_below_long_period() {
        let engine = IndicatorEngine::default();

        for len in 0..20 {
            let reading = engine.compute(&ramp(100.0, len));
            assert_eq!(
                reading,
                IndicatorReading::InsufficientData {
                    have: len,
                    need: 20
                }
            );
            assert!(reading.indicators().is_none());
        }
    }

    #[test]
    fn test_ready_at_exact_long_period() {
        let engine = IndicatorEngine::default();
        let reading = engine.compute(&ramp(100.0, 20));
        assert!(reading.is_ready());
    }

    #[test]
    fn test_uptrend_reading() {
        // 100, 101, ..., 120
        let engine = IndicatorEngine::default();
        let reading = engine.compute(&ramp(100.0, 21));

        let indicators = reading.indicators().copied().unwrap();
        assert!(indicators.short_ema > indicators.long_ema);
        assert!(indicators.spread() > 0.0);
        assert_eq!(indicators.rsi, 100.0);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let engine = IndicatorEngine::default();
        let prices: Vec<f64> = (0..50)
            .map(|i| 100.0 + ((i * 13) % 7) as f64 - 3.0)
            .collect();

        assert_eq!(engine.compute(&prices), engine.compute(&prices));
    }

    #[test]
    fn test_zero_period_is_never_ready() {
        let engine = IndicatorEngine::new(IndicatorConfig {
            short_period: 0,
            long_period: 5,
            rsi_period: 3,
        });
        assert!(!engine.compute(&ramp(100.0, 30)).is_ready());
    }
}
