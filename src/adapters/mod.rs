//! Concrete adapter implementations for ports.

pub mod chart_svg;
pub mod file_config_adapter;
pub mod rss_news_adapter;
pub mod yahoo_quote_adapter;
#[cfg(feature = "web")]
pub mod web;
