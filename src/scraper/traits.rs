use crate::model::{RawProduct, ScrapeError};

/// One retail source. Implementations are independent of each other: a
/// failing store must only surface as its own error, never as anyone
/// else's.
#[async_trait::async_trait]
pub trait StoreScraper: Send + Sync {
    fn name(&self) -> &str;

    /// Searches the store and returns candidates already filtered to names
    /// containing the term (sites routinely over-return).
    async fn search(&self, term: &str) -> Result<Vec<RawProduct>, ScrapeError>;
}
