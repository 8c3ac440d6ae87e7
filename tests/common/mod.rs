#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use vaultex::domain::error::VaultexError;
use vaultex::domain::news::NewsItem;
pub use vaultex::domain::quote::{OhlcvBar, Timeframe};
use vaultex::ports::news_port::NewsPort;
use vaultex::ports::quote_port::QuotePort;

pub struct MockQuotePort {
    pub bars: HashMap<String, Vec<OhlcvBar>>,
    pub prices: HashMap<String, f64>,
    pub errors: HashMap<String, String>,
}

impl MockQuotePort {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            prices: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl QuotePort for MockQuotePort {
    fn fetch_history(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
    ) -> Result<Vec<OhlcvBar>, VaultexError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(VaultexError::QuoteFetch {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.bars.get(symbol).cloned().unwrap_or_default())
    }

    fn last_price(&self, symbol: &str) -> Result<Option<f64>, VaultexError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(VaultexError::QuoteFetch {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        if let Some(&price) = self.prices.get(symbol) {
            return Ok(Some(price));
        }
        Ok(self
            .bars
            .get(symbol)
            .and_then(|bars| bars.last())
            .map(|bar| bar.close))
    }
}

#[derive(Default)]
pub struct MockNewsPort {
    pub items: Vec<NewsItem>,
    pub fail: bool,
}

impl MockNewsPort {
    pub fn with_items(items: Vec<NewsItem>) -> Self {
        Self { items, fail: false }
    }

    pub fn failing() -> Self {
        Self {
            items: Vec::new(),
            fail: true,
        }
    }
}

impl NewsPort for MockNewsPort {
    fn fetch_feed(&self, symbol: &str) -> Result<Vec<NewsItem>, VaultexError> {
        if self.fail {
            return Err(VaultexError::NewsFetch {
                symbol: symbol.to_string(),
                reason: "feed offline".to_string(),
            });
        }
        Ok(self.items.clone())
    }
}

pub fn ts(offset_secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + offset_secs, 0).unwrap()
}

pub fn make_bar(index: i64, close: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: ts(index * 60),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1_000,
    }
}

/// Bars with closes start_price, start_price + 1, ...
pub fn generate_bars(count: usize, start_price: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| make_bar(i as i64, start_price + i as f64))
        .collect()
}

pub fn make_news(count: usize) -> Vec<NewsItem> {
    (0..count)
        .map(|i| NewsItem {
            title: format!("Market headline {i}"),
            link: format!("https://news.example.com/{i}"),
            published: Some("Thu, 06 Aug 2026 12:00:00 +0000".to_string()),
        })
        .collect()
}
