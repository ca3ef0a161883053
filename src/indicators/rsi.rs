/// Calculate Relative Strength Index (RSI) with Wilder smoothing
///
/// The first average gain/loss is the simple mean over the first `period`
/// price changes; every later change is folded in with
/// `avg = (prev_avg * (period - 1) + current) / period`.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// A series with no losses yields 100; a completely flat series yields 50.
pub fn calculate_rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();

    let gain = |c: &f64| if *c > 0.0 { *c } else { 0.0 };
    let loss = |c: &f64| if *c < 0.0 { -*c } else { 0.0 };

    let mut avg_gain: f64 = changes[..period].iter().map(gain).sum::<f64>() / period as f64;
    let mut avg_loss: f64 = changes[..period].iter().map(loss).sum::<f64>() / period as f64;

    let smoothing = (period - 1) as f64;
    for change in &changes[period..] {
        avg_gain = (avg_gain * smoothing + gain(change)) / period as f64;
        avg_loss = (avg_loss * smoothing + loss(change)) / period as f64;
    }

    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return Some(50.0);
        }
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}
