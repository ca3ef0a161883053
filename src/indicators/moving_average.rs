/// Calculate Simple Moving Average (SMA) over the last `period` prices
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Calculate Exponential Moving Average (EMA)
///
/// Seeded with the SMA of the first `period` prices, then smoothed over
/// the rest of the series with `2 / (period + 1)`. Returns the latest value.
pub fn calculate_ema(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // Start with SMA
    let initial_sma = calculate_sma(&prices[0..period], period)?;

    let ema = prices[period..]
        .iter()
        .fold(initial_sma, |ema, price| (price - ema) * multiplier + ema);

    Some(ema)
}
