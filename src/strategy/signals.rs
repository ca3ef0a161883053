use rust_decimal::Decimal;

use crate::execution::Position;
use crate::indicators::IndicatorReading;
use crate::models::Signal;

/// RSI thresholds for the crossover rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalConfig {
    /// Buy only while RSI is strictly below this
    pub rsi_low_threshold: f64,
    /// Sell only while RSI is strictly above this
    pub rsi_upper_threshold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rsi_low_threshold: 50.0,
            rsi_upper_threshold: 50.0,
        }
    }
}

/// Classify the current reading into a trading signal
///
/// Rules, first match wins:
/// 1. no reading yet: Hold
/// 2. flat, short EMA above long EMA, RSI below the low threshold: Buy
/// 3. holding, short EMA below long EMA, RSI above the upper threshold: Sell
/// 4. otherwise Hold
///
/// All comparisons are strict so exact boundary values never trade.
pub fn decide(reading: &IndicatorReading, position: &Position, config: &SignalConfig) -> Signal {
    let indicators = match reading {
        IndicatorReading::Ready(indicators) => indicators,
        IndicatorReading::InsufficientData { .. } => return Signal::Hold,
    };

    let held = position.quantity_held();

    if held == Decimal::ZERO
        && indicators.short_ema > indicators.long_ema
        && indicators.rsi < config.rsi_low_threshold
    {
        Signal::Buy
    } else if held > Decimal::ZERO
        && indicators.short_ema < indicators.long_ema
        && indicators.rsi > config.rsi_upper_threshold
    {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Indicators;
    use crate::models::{Fill, OrderReport};
    use rust_decimal_macros::dec;

    fn reading(short_ema: f64, long_ema: f64, rsi: f64) -> IndicatorReading {
        IndicatorReading::Ready(Indicators {
            short_ema,
            long_ema,
            rsi,
        })
    }

    fn flat() -> Position {
        Position::new(dec!(1000))
    }

    fn holding() -> Position {
        let mut position = Position::new(dec!(1000));
        position
            .apply_buy(&OrderReport {
                fills: vec![Fill {
                    price: dec!(100),
                    quantity: dec!(1),
                }],
            })
            .unwrap();
        position
    }

    #[test]
    fn test_insufficient_data_holds() {
        let config = SignalConfig::default();
        let reading = IndicatorReading::InsufficientData { have: 3, need: 20 };
        assert_eq!(decide(&reading, &flat(), &config), Signal::Hold);
        assert_eq!(decide(&reading, &holding(), &config), Signal::Hold);
    }

    #[test]
    fn test_buy_on_crossover_with_low_rsi() {
        let config = SignalConfig::default();
        assert_eq!(decide(&reading(101.0, 100.0, 40.0), &flat(), &config), Signal::Buy);
    }

    #[test]
    fn test_sell_on_crossunder_with_high_rsi() {
        let config = SignalConfig::default();
        assert_eq!(decide(&reading(99.0, 100.0, 60.0), &holding(), &config), Signal::Sell);
    }

    #[test]
    fn test_uptrend_with_high_rsi_holds() {
        let config = SignalConfig::default();
        assert_eq!(decide(&reading(110.0, 100.0, 100.0), &flat(), &config), Signal::Hold);
    }

    #[test]
    fn test_no_flap_on_equal_emas() {
        let config = SignalConfig::default();
        assert_eq!(decide(&reading(100.0, 100.0, 10.0), &flat(), &config), Signal::Hold);
        assert_eq!(decide(&reading(100.0, 100.0, 90.0), &holding(), &config), Signal::Hold);
    }

    #[test]
    fn test_no_flap_on_rsi_threshold() {
        let config = SignalConfig {
            rsi_low_threshold: 30.0,
            rsi_upper_threshold: 70.0,
        };
        assert_eq!(decide(&reading(101.0, 100.0, 30.0), &flat(), &config), Signal::Hold);
        assert_eq!(decide(&reading(99.0, 100.0, 70.0), &holding(), &config), Signal::Hold);
    }

    #[test]
    fn test_single_position_discipline() {
        let config = SignalConfig::default();
        let grid = [
            (101.0, 100.0, 10.0),
            (101.0, 100.0, 90.0),
            (99.0, 100.0, 10.0),
            (99.0, 100.0, 90.0),
            (100.0, 100.0, 50.0),
        ];

        for (short, long, rsi) in grid {
            let r = reading(short, long, rsi);
            assert_ne!(decide(&r, &holding(), &config), Signal::Buy);
            assert_ne!(decide(&r, &flat(), &config), Signal::Sell);
        }
    }

    #[test]
    fn test_decide_is_deterministic() {
        let config = SignalConfig::default();
        let r = reading(101.0, 100.0, 40.0);
        let position = flat();
        let first = decide(&r, &position, &config);
        for _ in 0..10 {
            assert_eq!(decide(&r, &position, &config), first);
        }
    }
}
