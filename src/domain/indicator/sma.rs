//! Simple Moving Average.

/// Arithmetic mean of the last `window` closes. `None` until `window`
/// samples exist; callers render a partial window as "N/A", never as a
/// partial average.
pub fn sma(closes: &[f64], window: usize) -> Option<f64> {
    if window == 0 || closes.len() < window {
        return None;
    }
    let sum: f64 = closes[closes.len() - window..].iter().sum();
    Some(sum / window as f64)
}
