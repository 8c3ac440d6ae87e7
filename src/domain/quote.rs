//! Market data types: OHLCV bars, timeframes and derived statistics.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Dashboard timeframe. Each maps to a provider (range, interval) pair; the
/// three shortest additionally trim to the tail of the returned series so
/// "15m" really is the last fifteen one-minute bars of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    M15,
    H1,
    D1,
    D5,
    Mo1,
    Mo3,
    Mo6,
    Y1,
    Y5,
}

impl Timeframe {
    pub const ALL: [Timeframe; 9] = [
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::D1,
        Timeframe::D5,
        Timeframe::Mo1,
        Timeframe::Mo3,
        Timeframe::Mo6,
        Timeframe::Y1,
        Timeframe::Y5,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::D1 => "1d",
            Timeframe::D5 => "5d",
            Timeframe::Mo1 => "1mo",
            Timeframe::Mo3 => "3mo",
            Timeframe::Mo6 => "6mo",
            Timeframe::Y1 => "1y",
            Timeframe::Y5 => "5y",
        }
    }

    /// Provider range parameter.
    pub fn range(&self) -> &'static str {
        match self {
            Timeframe::M15 | Timeframe::H1 | Timeframe::D1 => "1d",
            Timeframe::D5 => "5d",
            Timeframe::Mo1 => "1mo",
            Timeframe::Mo3 => "3mo",
            Timeframe::Mo6 => "6mo",
            Timeframe::Y1 => "1y",
            Timeframe::Y5 => "5y",
        }
    }

    /// Provider interval parameter.
    pub fn interval(&self) -> &'static str {
        match self {
            Timeframe::M15 => "1m",
            Timeframe::H1 => "2m",
            Timeframe::D1 => "5m",
            Timeframe::D5 => "15m",
            _ => "1d",
        }
    }

    /// Keep only the last N bars of the fetched series, if set.
    pub fn tail(&self) -> Option<usize> {
        match self {
            Timeframe::M15 => Some(15),
            Timeframe::H1 => Some(30),
            _ => None,
        }
    }

    /// Short intraday frames are refreshed aggressively by the UI.
    pub fn is_intraday(&self) -> bool {
        matches!(self, Timeframe::M15 | Timeframe::H1 | Timeframe::D1)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown timeframe: {s}"))
    }
}

/// Statistics derived from one fetched bar series. Division guards apply
/// throughout: a zero previous close or zero first close yields a zero
/// percentage, never a NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub last_price: f64,
    pub prev_close: f64,
    pub change: f64,
    pub change_pct: f64,
    pub range_high: f64,
    pub range_low: f64,
    pub avg_volume: f64,
    pub total_volume: i64,
    pub period_return_pct: f64,
    pub volatility_pct: f64,
    pub bullish: bool,
}

impl MarketSnapshot {
    pub fn from_bars(bars: &[OhlcvBar]) -> Option<Self> {
        let last = bars.last()?;
        let last_price = last.close;
        let prev_close = if bars.len() > 1 {
            bars[bars.len() - 2].close
        } else {
            last_price
        };

        let change = last_price - prev_close;
        let change_pct = if prev_close != 0.0 {
            change / prev_close * 100.0
        } else {
            0.0
        };

        let range_high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let range_low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let total_volume: i64 = bars.iter().map(|b| b.volume).sum();
        let avg_volume = total_volume as f64 / bars.len() as f64;

        let first_close = bars[0].close;
        let period_return_pct = if first_close != 0.0 {
            (last_price - first_close) / first_close * 100.0
        } else {
            0.0
        };

        Some(MarketSnapshot {
            last_price,
            prev_close,
            change,
            change_pct,
            range_high,
            range_low,
            avg_volume,
            total_volume,
            period_return_pct,
            volatility_pct: volatility(bars),
            bullish: change > 0.0,
        })
    }
}

/// Population standard deviation of successive close-to-close percentage
/// changes. Bars following a zero close are skipped.
fn volatility(bars: &[OhlcvBar]) -> f64 {
    let returns: Vec<f64> = bars
        .windows(2)
        .filter(|w| w[0].close != 0.0)
        .map(|w| (w[1].close - w[0].close) / w[0].close * 100.0)
        .collect();

    if returns.is_empty() {
        return 0.0;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt()
}
