//! Yahoo Finance chart API quote adapter.
//!
//! Talks to the v8 chart endpoint over HTTPS and maps the JSON payload to
//! domain bars. Unknown symbols and empty result sets come back as empty
//! series per the quote port contract; only transport and decode failures
//! are errors.

use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::error::VaultexError;
use crate::domain::quote::{OhlcvBar, Timeframe};
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct YahooQuoteAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooQuoteAdapter {
    pub fn new() -> Result<Self, VaultexError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, VaultexError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("vaultex/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VaultexError::HttpClient {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Reads `[market] quote_base_url`, falling back to the public endpoint.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, VaultexError> {
        let base_url = config
            .get_string("market", "quote_base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }
}

impl QuotePort for YahooQuoteAdapter {
    fn fetch_history(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<OhlcvBar>, VaultexError> {
        let symbol = symbol.trim().to_uppercase();
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url,
            symbol,
            timeframe.range(),
            timeframe.interval(),
        );

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| VaultexError::QuoteFetch {
                symbol: symbol.clone(),
                reason: e.to_string(),
            })?;

        // Yahoo answers 404 for symbols it does not know.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(VaultexError::QuoteFetch {
                symbol,
                reason: format!("HTTP {}", response.status()),
            });
        }

        let body = response.text().map_err(|e| VaultexError::QuoteFetch {
            symbol: symbol.clone(),
            reason: e.to_string(),
        })?;

        let mut bars = parse_chart_response(&symbol, &body)?;
        if let Some(keep) = timeframe.tail() {
            if bars.len() > keep {
                bars.drain(..bars.len() - keep);
            }
        }
        Ok(bars)
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartPayload,
}

#[derive(Debug, Deserialize)]
struct ChartPayload {
    result: Option<Vec<ChartSeries>>,
}

#[derive(Debug, Deserialize)]
struct ChartSeries {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

/// Decode one chart response body. Rows with a null close (market holidays,
/// in-progress candles) are dropped; null open/high/low fall back to the
/// close of the same row.
pub fn parse_chart_response(symbol: &str, body: &str) -> Result<Vec<OhlcvBar>, VaultexError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| VaultexError::QuoteFetch {
            symbol: symbol.to_string(),
            reason: format!("malformed response: {e}"),
        })?;

    let Some(series) = envelope
        .chart
        .result
        .and_then(|mut results| (!results.is_empty()).then(|| results.remove(0)))
    else {
        return Ok(Vec::new());
    };
    let Some(quote) = series.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut bars = Vec::with_capacity(series.timestamp.len());
    for (i, &ts) in series.timestamp.iter().enumerate() {
        let Some(close) = quote.close.get(i).copied().flatten() else {
            continue;
        };
        let Some(timestamp) = DateTime::from_timestamp(ts, 0) else {
            continue;
        };
        bars.push(OhlcvBar {
            timestamp,
            open: quote.open.get(i).copied().flatten().unwrap_or(close),
            high: quote.high.get(i).copied().flatten().unwrap_or(close),
            low: quote.low.get(i).copied().flatten().unwrap_or(close),
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "BTC-USD"},
                "timestamp": [1700000000, 1700000060, 1700000120],
                "indicators": {
                    "quote": [{
                        "open":   [100.0, 101.0, null],
                        "high":   [102.0, 103.0, 104.0],
                        "low":    [99.0,  100.0, 101.0],
                        "close":  [101.0, 102.0, 103.0],
                        "volume": [1000, null, 3000]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_bars_and_fills_null_fields() {
        let bars = parse_chart_response("BTC-USD", SAMPLE).unwrap();
        assert_eq!(bars.len(), 3);
        assert!((bars[0].close - 101.0).abs() < f64::EPSILON);
        assert_eq!(bars[1].volume, 0);
        // Null open falls back to that row's close.
        assert!((bars[2].open - 103.0).abs() < f64::EPSILON);
        assert_eq!(bars[0].timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn rows_with_null_close_are_dropped() {
        let body = r#"{"chart":{"result":[{
            "timestamp": [1700000000, 1700000060],
            "indicators": {"quote": [{
                "close": [null, 50.0], "volume": [1, 2]
            }]}
        }],"error":null}}"#;
        let bars = parse_chart_response("X", body).unwrap();
        assert_eq!(bars.len(), 1);
        assert!((bars[0].close - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn null_result_means_no_data() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let bars = parse_chart_response("NOPE", body).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn empty_result_list_means_no_data() {
        let body = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(parse_chart_response("X", body).unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_a_quote_error() {
        let err = parse_chart_response("X", "not json").unwrap_err();
        assert!(matches!(err, VaultexError::QuoteFetch { .. }));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let adapter = YahooQuoteAdapter::with_base_url("http://localhost:9/").unwrap();
        assert_eq!(adapter.base_url, "http://localhost:9");
    }
}
