use reqwest::{Client, Url};
use tracing::debug;

use crate::model::{RawProduct, ScrapeError};
use crate::scraper::extract;
use crate::scraper::traits::StoreScraper;

/// Static description of one store's search page.
#[derive(Debug, Clone, Copy)]
pub struct SiteConfig {
    pub store: &'static str,
    pub base_url: &'static str,
    /// Search endpoint without the query string.
    pub search_url: &'static str,
    /// Query parameter carrying the search term.
    pub term_param: &'static str,
    /// Fixed extra query parameters some sites insist on.
    pub extra_params: &'static [(&'static str, &'static str)],
    /// Product card selectors, tried in order.
    pub card_selectors: &'static [&'static str],
}

/// Fetch-and-extract scraper driven entirely by a [`SiteConfig`].
pub struct SiteScraper {
    client: Client,
    config: SiteConfig,
}

impl SiteScraper {
    pub fn new(client: Client, config: SiteConfig) -> Self {
        Self { client, config }
    }

    fn search_url(&self, term: &str) -> Result<Url, ScrapeError> {
        let mut url = Url::parse(self.config.search_url)
            .map_err(|e| ScrapeError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair(self.config.term_param, term);
        for (key, value) in self.config.extra_params {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl StoreScraper for SiteScraper {
    fn name(&self) -> &str {
        self.config.store
    }

    async fn search(&self, term: &str) -> Result<Vec<RawProduct>, ScrapeError> {
        let url = self.search_url(term)?;
        debug!(store = self.config.store, %url, "fetching search page");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ScrapeError::Status(response.status().as_u16()));
        }
        let html = response.text().await?;

        let products = extract::extract_products(
            &html,
            self.config.store,
            self.config.base_url,
            self.config.card_selectors,
        );
        debug!(store = self.config.store, count = products.len(), "extracted candidates");

        Ok(filter_by_term(products, term))
    }
}

/// Keeps only candidates whose name contains the term, case-insensitively.
pub fn filter_by_term(products: Vec<RawProduct>, term: &str) -> Vec<RawProduct> {
    let term = term.to_lowercase();
    products
        .into_iter()
        .filter(|p| p.name.to_lowercase().contains(&term))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str) -> RawProduct {
        RawProduct {
            store: "Aldi".to_string(),
            name: name.to_string(),
            price: 1.0,
            volume: String::new(),
            image: String::new(),
            link: String::new(),
        }
    }

    #[test]
    fn filters_candidates_by_term() {
        let products = vec![raw("Duvel 33cl"), raw("Jupiler 25cl"), raw("DUVEL Tripel Hop")];
        let filtered = filter_by_term(products, "duvel");
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|p| p.name.to_lowercase().contains("duvel")));
    }

    #[test]
    fn search_url_encodes_the_term() {
        let scraper = SiteScraper::new(
            Client::new(),
            SiteConfig {
                store: "Aldi",
                base_url: "https://www.aldi.be",
                search_url: "https://www.aldi.be/nl/zoekresultaten.html",
                term_param: "query",
                extra_params: &[("searchCategory", "Submitted Search")],
                card_selectors: &[".mod-article-tile"],
            },
        );
        let url = scraper.search_url("stella artois").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.aldi.be/nl/zoekresultaten.html?query=stella+artois&searchCategory=Submitted+Search"
        );
    }
}
