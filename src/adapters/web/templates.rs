//! HTML templates and view models using Askama.
//!
//! Templates stay dumb: every number is formatted here so the HTML files
//! only interpolate strings.

use askama::Template;
use std::collections::HashMap;

use crate::adapters::chart_svg::price_chart_svg;
use crate::domain::indicator::{RsiZone, rsi, sma};
use crate::domain::ledger::{Ledger, Side, TradeLogEntry};
use crate::domain::news::NewsItem;
use crate::domain::quote::{MarketSnapshot, OhlcvBar, Timeframe};

pub const CURRENCY: &str = "PKR";
pub const SMA_FAST: usize = 20;
pub const SMA_SLOW: usize = 50;
pub const RSI_WINDOW: usize = 14;
pub const NEWS_LIMIT: usize = 6;
pub const TRADE_LOG_LIMIT: usize = 8;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}

impl<'a> ErrorTemplate<'a> {
    pub fn fragment(&self) -> String {
        format!(
            "<div id=\"error\" class=\"banner err\"><strong>Error {}</strong> {}</div>",
            self.status, self.message
        )
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub username: String,
    pub currency: &'static str,
    pub symbol: String,
    pub timeframe: String,
    pub timeframes: Vec<TimeframeOption>,
    /// Page auto-reload cadence for intraday frames, seconds.
    pub refresh_secs: Option<u16>,
    pub notice: Option<String>,
    pub error_msg: Option<String>,
    pub market: Option<MarketPanel>,
    pub market_error: Option<String>,
    pub wallet: WalletPanel,
    pub watchlist: Vec<WatchRow>,
    pub holdings: Vec<HoldingRow>,
    pub trades: Vec<TradeRow>,
    pub news: Vec<NewsRow>,
    pub news_error: Option<String>,
    pub videos: Vec<VideoRow>,
    pub funding_min: String,
    pub funding_max: String,
}

pub struct TimeframeOption {
    pub label: &'static str,
    pub selected: bool,
}

pub fn timeframe_options(selected: Timeframe) -> Vec<TimeframeOption> {
    Timeframe::ALL
        .into_iter()
        .map(|tf| TimeframeOption {
            label: tf.label(),
            selected: tf == selected,
        })
        .collect()
}

/// Everything derived from one fetched bar series.
pub struct MarketPanel {
    pub last_price: String,
    pub change: String,
    pub bullish: bool,
    pub sentiment: String,
    pub range_high: String,
    pub range_low: String,
    pub avg_volume: String,
    pub total_volume: String,
    pub period_return: String,
    pub volatility: String,
    pub points: usize,
    pub chart_svg: String,
    pub sma_fast: String,
    pub sma_slow: String,
    pub rsi: String,
    pub rsi_hint: String,
}

impl MarketPanel {
    pub fn build(bars: &[OhlcvBar]) -> Option<Self> {
        let snapshot = MarketSnapshot::from_bars(bars)?;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let rsi_value = rsi(&closes, RSI_WINDOW);
        let rsi_hint = match RsiZone::of(rsi_value) {
            RsiZone::Overbought => "Overbought: consider selling",
            RsiZone::Oversold => "Oversold: consider buying",
            RsiZone::Neutral => "Neutral zone",
        };

        Some(MarketPanel {
            last_price: fmt_money(snapshot.last_price),
            change: format!(
                "{} ({:+.2}%)",
                fmt_signed_money(snapshot.change),
                snapshot.change_pct
            ),
            bullish: snapshot.bullish,
            sentiment: if snapshot.bullish { "BULLISH" } else { "BEARISH" }.to_string(),
            range_high: fmt_money(snapshot.range_high),
            range_low: fmt_money(snapshot.range_low),
            avg_volume: fmt_volume(snapshot.avg_volume),
            total_volume: fmt_volume(snapshot.total_volume as f64),
            period_return: format!("{:+.2}%", snapshot.period_return_pct),
            volatility: format!("{:.2}%", snapshot.volatility_pct),
            points: bars.len(),
            chart_svg: price_chart_svg(bars),
            sma_fast: sma(&closes, SMA_FAST)
                .map(|v| format!("{CURRENCY} {}", fmt_money(v)))
                .unwrap_or_else(|| "N/A".to_string()),
            sma_slow: sma(&closes, SMA_SLOW)
                .map(|v| format!("{CURRENCY} {}", fmt_money(v)))
                .unwrap_or_else(|| "N/A".to_string()),
            rsi: format!("{rsi_value:.2}"),
            rsi_hint: rsi_hint.to_string(),
        })
    }
}

pub struct WalletPanel {
    pub cash: String,
    pub net_worth: String,
    pub pl_abs: String,
    pub pl_pct: String,
    pub pl_positive: bool,
}

impl WalletPanel {
    pub fn build(ledger: &Ledger, prices: &HashMap<String, f64>) -> Self {
        let net_worth = ledger.net_worth(prices);
        let (absolute, percent) = ledger.profit_loss(net_worth);
        WalletPanel {
            cash: fmt_money(ledger.cash()),
            net_worth: fmt_money(net_worth),
            pl_abs: fmt_signed_money(absolute),
            pl_pct: format!("{percent:+.2}%"),
            pl_positive: absolute >= 0.0,
        }
    }

    /// HTMX fragment replacing the wallet card in place.
    pub fn fragment(&self) -> String {
        format!(
            "<div id=\"wallet\" class=\"card wallet\" hx-swap-oob=\"true\"><h2>Wallet</h2>\
             <div class=\"metric\"><span>Cash</span><strong>{currency} {cash}</strong></div>\
             <div class=\"metric\"><span>Net Worth</span><strong>{currency} {net}</strong></div>\
             <div class=\"metric {class}\"><span>Total P/L</span><strong>{currency} {abs} ({pct})</strong></div></div>",
            currency = CURRENCY,
            cash = self.cash,
            net = self.net_worth,
            class = if self.pl_positive { "gain" } else { "loss" },
            abs = self.pl_abs,
            pct = self.pl_pct,
        )
    }
}

pub struct WatchRow {
    pub symbol: String,
    pub price: String,
}

pub fn watch_rows(prices: &[(String, f64)]) -> Vec<WatchRow> {
    prices
        .iter()
        .map(|(symbol, price)| WatchRow {
            symbol: symbol.clone(),
            price: fmt_money(*price),
        })
        .collect()
}

pub struct HoldingRow {
    pub symbol: String,
    pub quantity: i64,
    pub price: String,
    pub value: String,
}

/// Position table rows, sorted by symbol for a stable rendering order.
/// A symbol without a quote shows a zero price and value.
pub fn holding_rows(ledger: &Ledger, prices: &HashMap<String, f64>) -> Vec<HoldingRow> {
    let mut rows: Vec<HoldingRow> = ledger
        .holdings()
        .iter()
        .map(|(symbol, &quantity)| {
            let price = prices.get(symbol).copied().unwrap_or(0.0);
            HoldingRow {
                symbol: symbol.clone(),
                quantity,
                price: fmt_money(price),
                value: fmt_money(quantity as f64 * price),
            }
        })
        .collect();
    rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    rows
}

pub struct TradeRow {
    pub time: String,
    pub side: String,
    pub is_buy: bool,
    pub symbol: String,
    pub quantity: i64,
    pub price: String,
}

/// Most recent trades first, capped at [`TRADE_LOG_LIMIT`].
pub fn trade_rows(log: &[TradeLogEntry]) -> Vec<TradeRow> {
    log.iter()
        .rev()
        .take(TRADE_LOG_LIMIT)
        .map(|entry| TradeRow {
            time: entry.timestamp.format("%H:%M:%S").to_string(),
            side: entry.side.to_string(),
            is_buy: entry.side == Side::Buy,
            symbol: entry.symbol.clone(),
            quantity: entry.quantity,
            price: fmt_money(entry.price),
        })
        .collect()
}

pub struct NewsRow {
    pub title: String,
    pub link: String,
    pub published: String,
}

pub fn news_rows(items: &[NewsItem]) -> Vec<NewsRow> {
    items
        .iter()
        .take(NEWS_LIMIT)
        .map(|item| NewsRow {
            title: item.title.clone(),
            link: item.link.clone(),
            published: item.published.clone().unwrap_or_else(|| "Recent".to_string()),
        })
        .collect()
}

pub struct VideoRow {
    pub label: String,
    pub url: String,
}

/// Deterministic video research links for a symbol.
pub fn research_links(symbol: &str) -> Vec<VideoRow> {
    ["trading strategy", "technical analysis", "news today", "price prediction"]
        .into_iter()
        .map(|topic| {
            let query = format!("{symbol} {topic}");
            VideoRow {
                url: format!(
                    "https://www.youtube.com/results?search_query={}",
                    query.replace(' ', "+")
                ),
                label: query,
            }
        })
        .collect()
}

/// Thousands-grouped fixed two-decimal rendering, e.g. `24,600.00`.
pub fn fmt_money(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u128;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{grouped}.{frac:02}", if negative { "-" } else { "" })
}

/// Like [`fmt_money`] with an explicit sign, e.g. `+250.00`.
pub fn fmt_signed_money(value: f64) -> String {
    if value >= 0.0 {
        format!("+{}", fmt_money(value))
    } else {
        fmt_money(value)
    }
}

/// Compact volume rendering: `1.2B`, `34.5M`, `6.7K`, or the plain number.
pub fn fmt_volume(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{value:.0}")
    }
}
