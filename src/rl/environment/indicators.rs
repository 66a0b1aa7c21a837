//! Technical indicators used to build the observation series.

/// RSI value reported while the indicator is still warming up
pub const NEUTRAL_RSI: f64 = 50.0;

/// Wilder-smoothed relative strength index.
///
/// The output has the same length as `prices`. The first `period` rows have
/// no full look-back window and are reported as [`NEUTRAL_RSI`].
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    let len = prices.len();
    let mut out = vec![NEUTRAL_RSI; len];
    if period == 0 || len <= period {
        return out;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = prices[i] - prices[i - 1];
        avg_gain += change.max(0.0);
        avg_loss += (-change).max(0.0);
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    out[period] = rsi_value(avg_gain, avg_loss);

    let p = period as f64;
    for i in (period + 1)..len {
        let change = prices[i] - prices[i - 1];
        avg_gain = (avg_gain * (p - 1.0) + change.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-change).max(0.0)) / p;
        out[i] = rsi_value(avg_gain, avg_loss);
    }

    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            NEUTRAL_RSI
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// First differences, with 0.0 for the first row.
pub fn deltas(prices: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(prices.len());
    for (i, price) in prices.iter().enumerate() {
        if i == 0 {
            out.push(0.0);
        } else {
            out.push(price - prices[i - 1]);
        }
    }
    out
}
