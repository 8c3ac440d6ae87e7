//! Yahoo Finance headline RSS news adapter.
//!
//! The feed is plain RSS 2.0. No dependency in the stack parses XML, so the
//! adapter carries a minimal `<item>` extractor that handles CDATA and the
//! five predefined XML entities, which is all the feed uses.

use std::time::Duration;

use crate::domain::error::VaultexError;
use crate::domain::news::NewsItem;
use crate::ports::config_port::ConfigPort;
use crate::ports::news_port::NewsPort;

const DEFAULT_BASE_URL: &str = "https://feeds.finance.yahoo.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RssNewsAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl RssNewsAdapter {
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

    /// Reads `[market] news_base_url`, falling back to the public feed host.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, VaultexError> {
        let base_url = config
            .get_string("market", "news_base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }
}

impl NewsPort for RssNewsAdapter {
    fn fetch_feed(&self, symbol: &str) -> Result<Vec<NewsItem>, VaultexError> {
        let symbol = symbol.trim().to_uppercase();
        let url = format!(
            "{}/rss/2.0/headline?s={}&region=US&lang=en-US",
            self.base_url, symbol,
        );

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| VaultexError::NewsFetch {
                symbol: symbol.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(VaultexError::NewsFetch {
                symbol,
                reason: format!("HTTP {}", response.status()),
            });
        }

        let body = response.text().map_err(|e| VaultexError::NewsFetch {
            symbol: symbol.clone(),
            reason: e.to_string(),
        })?;

        Ok(parse_feed(&body))
    }
}

/// Extract news items from an RSS 2.0 document, in document order. Items
/// missing a title or link are skipped; an unparseable document yields an
/// empty list (the dashboard treats no news as a normal state).
pub fn parse_feed(body: &str) -> Vec<NewsItem> {
    let mut items = Vec::new();
    let mut rest = body;

    while let Some(start) = rest.find("<item") {
        let block_start = &rest[start..];
        let Some(end) = block_start.find("</item>") else {
            break;
        };
        let block = &block_start[..end];

        if let (Some(title), Some(link)) = (tag_text(block, "title"), tag_text(block, "link")) {
            items.push(NewsItem {
                title,
                link,
                published: tag_text(block, "pubDate"),
            });
        }

        rest = &block_start[end + "</item>".len()..];
    }
    items
}

/// Text content of the first `<tag>...</tag>` in `block`, CDATA unwrapped
/// and entities decoded.
fn tag_text(block: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let start = block.find(&open)?;
    let after_open = &block[start + open.len()..];
    let gt = after_open.find('>')?;
    let content = &after_open[gt + 1..];
    let end = content.find(&close)?;

    let text = unescape(strip_cdata(content[..end].trim()));
    (!text.is_empty()).then_some(text)
}

fn strip_cdata(text: &str) -> &str {
    text.strip_prefix("<![CDATA[")
        .and_then(|t| t.strip_suffix("]]>"))
        .unwrap_or(text)
        .trim()
}

fn unescape(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
}
