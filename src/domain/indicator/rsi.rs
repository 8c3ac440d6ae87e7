//! RSI (Relative Strength Index).
//!
//! Rolling-mean variant: average gain over the last n deltas divided by
//! average loss over the same deltas, mapped via RSI = 100 - 100/(1 + RS).
//! If the average loss is 0 the RS is unbounded and RSI is reported as 100.
//! Before n+1 closes exist the neutral default 50 is reported.

use std::fmt;

pub const NEUTRAL: f64 = 50.0;

pub fn rsi(closes: &[f64], window: usize) -> f64 {
    if window == 0 || closes.len() < window + 1 {
        return NEUTRAL;
    }

    let mut gain = 0.0;
    let mut loss = 0.0;
    for pair in closes[closes.len() - window - 1..].windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gain += change;
        } else {
            loss += -change;
        }
    }

    let avg_gain = gain / window as f64;
    let avg_loss = loss / window as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

/// Conventional reading of an RSI value: above 70 overbought, below 30
/// oversold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn of(value: f64) -> Self {
        if value > 70.0 {
            RsiZone::Overbought
        } else if value < 30.0 {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }
}

impl fmt::Display for RsiZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RsiZone::Overbought => write!(f, "overbought"),
            RsiZone::Oversold => write!(f, "oversold"),
            RsiZone::Neutral => write!(f, "neutral"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rsi_neutral_before_warmup() {
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        // 14 closes give only 13 deltas, one short of a 14-window.
        assert_relative_eq!(rsi(&closes, 14), NEUTRAL);
        assert_relative_eq!(rsi(&[], 14), NEUTRAL);
        assert_relative_eq!(rsi(&closes, 0), NEUTRAL);
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert_relative_eq!(rsi(&closes, 14), 100.0);
    }

    #[test]
    fn rsi_flat_series_is_100() {
        // Zero average loss, by convention reported as 100 rather than NaN.
        let closes = [100.0; 20];
        assert_relative_eq!(rsi(&closes, 14), 100.0);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        assert_relative_eq!(rsi(&closes, 14), 0.0);
    }

    #[test]
    fn rsi_balanced_gains_and_losses_is_50() {
        // Alternating +1/-1 over the window: avg gain == avg loss.
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 1.0 } else { last - 1.0 });
        }
        assert_relative_eq!(rsi(&closes, 14), 50.0);
    }

    #[test]
    fn rsi_uses_only_the_trailing_window() {
        // A huge early loss outside the window must not affect the result.
        let mut closes = vec![1_000.0, 10.0];
        for i in 0..14 {
            closes.push(10.0 + i as f64);
        }
        assert_relative_eq!(rsi(&closes, 14), 100.0);
    }

    #[test]
    fn rsi_stays_in_range() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + ((i % 7) as f64 - 3.0) * 2.0)
            .collect();
        let value = rsi(&closes, 14);
        assert!((0.0..=100.0).contains(&value), "RSI {value} out of range");
    }

    #[test]
    fn zone_thresholds() {
        assert_eq!(RsiZone::of(71.0), RsiZone::Overbought);
        assert_eq!(RsiZone::of(70.0), RsiZone::Neutral);
        assert_eq!(RsiZone::of(30.0), RsiZone::Neutral);
        assert_eq!(RsiZone::of(29.9), RsiZone::Oversold);
        assert_eq!(RsiZone::of(50.0), RsiZone::Neutral);
    }
}
