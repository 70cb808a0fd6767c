// Store scrapers: per-site configuration, fetch, and DOM extraction.

pub mod extract;
pub mod fetcher;
pub mod sites;
pub mod traits;

pub use fetcher::SiteScraper;
pub use traits::StoreScraper;
