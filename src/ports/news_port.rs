//! News feed port trait.

use crate::domain::error::VaultexError;
use crate::domain::news::NewsItem;

pub trait NewsPort {
    fn fetch_feed(&self, symbol: &str) -> Result<Vec<NewsItem>, VaultexError>;
}
