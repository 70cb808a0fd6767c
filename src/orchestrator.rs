//! Fans a search term out to every configured store scraper.
//!
//! One task per scraper, admission-bounded by a semaphore so no more than
//! `max_concurrent` scrapers run at once regardless of how many stores are
//! configured. Every task is joined before results are processed; a failed
//! or hanging store becomes a failed outcome and never disturbs the rest.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::model::{Product, RawProduct, ScrapeError, ScraperOutcome, SearchRun};
use crate::normalizer;
use crate::ranker;
use crate::scraper::StoreScraper;

pub struct Orchestrator {
    scrapers: Vec<Arc<dyn StoreScraper>>,
    max_concurrent: usize,
    scraper_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        scrapers: Vec<Arc<dyn StoreScraper>>,
        max_concurrent: usize,
        scraper_timeout: Duration,
    ) -> Self {
        Self {
            scrapers,
            max_concurrent,
            scraper_timeout,
        }
    }

    /// Runs every scraper for `term` and returns the ranked products plus
    /// one outcome per scraper, in completion order. Never retries and
    /// never cancels siblings: partial results are always usable.
    pub async fn run(&self, term: &str) -> SearchRun {
        let start = Instant::now();
        info!(term, scrapers = self.scrapers.len(), "starting search run");

        let gate = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks: JoinSet<(ScraperOutcome, Vec<RawProduct>)> = JoinSet::new();
        let mut names: HashMap<tokio::task::Id, String> = HashMap::new();

        for scraper in &self.scrapers {
            let scraper = Arc::clone(scraper);
            let gate = Arc::clone(&gate);
            let term = term.to_string();
            let per_scraper_timeout = self.scraper_timeout;

            let name = scraper.name().to_string();
            let handle = tasks.spawn(async move {
                run_one(scraper, gate, &term, per_scraper_timeout).await
            });
            names.insert(handle.id(), name);
        }

        let mut outcomes = Vec::with_capacity(self.scrapers.len());
        let mut raw_products = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, (outcome, products))) => {
                    outcomes.push(outcome);
                    raw_products.extend(products);
                }
                Err(e) => {
                    let name = names
                        .get(&e.id())
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string());
                    warn!(store = %name, error = %e, "scraper task aborted");
                    outcomes.push(ScraperOutcome {
                        name,
                        success: false,
                        error: Some(e.to_string()),
                        count: 0,
                        elapsed_time: 0.0,
                    });
                }
            }
        }

        let mut products: Vec<Product> = raw_products
            .into_iter()
            .filter_map(normalizer::normalize)
            .collect();
        ranker::rank(&mut products);

        let total_elapsed = start.elapsed().as_secs_f64();
        let succeeded = outcomes.iter().filter(|o| o.success).count();
        info!(
            term,
            products = products.len(),
            succeeded,
            failed = outcomes.len() - succeeded,
            elapsed = total_elapsed,
            "search run finished"
        );

        SearchRun {
            products,
            outcomes,
            total_elapsed,
        }
    }
}

async fn run_one(
    scraper: Arc<dyn StoreScraper>,
    gate: Arc<Semaphore>,
    term: &str,
    per_scraper_timeout: Duration,
) -> (ScraperOutcome, Vec<RawProduct>) {
    let name = scraper.name().to_string();

    let _permit = match gate.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            return (
                ScraperOutcome {
                    name,
                    success: false,
                    error: Some("admission gate closed".to_string()),
                    count: 0,
                    elapsed_time: 0.0,
                },
                Vec::new(),
            );
        }
    };

    let started = Instant::now();
    info!(store = %name, "scraper started");

    let result = match timeout(per_scraper_timeout, scraper.search(term)).await {
        Ok(result) => result,
        Err(_) => Err(ScrapeError::Timeout(per_scraper_timeout.as_secs())),
    };
    let elapsed_time = started.elapsed().as_secs_f64();

    match result {
        Ok(products) => {
            info!(store = %name, count = products.len(), elapsed = elapsed_time, "scraper finished");
            (
                ScraperOutcome {
                    name,
                    success: true,
                    error: None,
                    count: products.len(),
                    elapsed_time,
                },
                products,
            )
        }
        Err(e) => {
            warn!(store = %name, error = %e, elapsed = elapsed_time, "scraper failed");
            (
                ScraperOutcome {
                    name,
                    success: false,
                    error: Some(e.to_string()),
                    count: 0,
                    elapsed_time,
                },
                Vec::new(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    /// Scripted scraper for orchestrator tests: optionally fails, hangs,
    /// and tracks how many instances run at the same instant.
    struct FakeScraper {
        name: String,
        products: Vec<RawProduct>,
        fail: bool,
        delay: Duration,
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl FakeScraper {
        fn new(name: &str, products: Vec<RawProduct>) -> Self {
            Self {
                name: name.to_string(),
                products,
                fail: false,
                delay: Duration::from_millis(10),
                running: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(name: &str) -> Self {
            let mut s = Self::new(name, Vec::new());
            s.fail = true;
            s
        }
    }

    #[async_trait::async_trait]
    impl StoreScraper for FakeScraper {
        fn name(&self) -> &str {
            &self.name
        }

        async fn search(&self, _term: &str) -> Result<Vec<RawProduct>, ScrapeError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            if self.fail {
                Err(ScrapeError::Status(503))
            } else {
                Ok(self.products.clone())
            }
        }
    }

    /// Scraper whose task panics mid-search.
    struct PanickingScraper {
        name: String,
    }

    #[async_trait::async_trait]
    impl StoreScraper for PanickingScraper {
        fn name(&self) -> &str {
            &self.name
        }

        async fn search(&self, _term: &str) -> Result<Vec<RawProduct>, ScrapeError> {
            panic!("selector table corrupted");
        }
    }

    fn raw(store: &str, name: &str, price: f64, volume: &str) -> RawProduct {
        RawProduct {
            store: store.to_string(),
            name: name.to_string(),
            price,
            volume: volume.to_string(),
            image: String::new(),
            link: String::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_isolated_per_scraper() {
        let scrapers: Vec<Arc<dyn StoreScraper>> = vec![
            Arc::new(FakeScraper::new(
                "Aldi",
                vec![raw("Aldi", "Duvel 33cl", 1.5, "")],
            )),
            Arc::new(FakeScraper::failing("Lidl")),
            Arc::new(FakeScraper::new(
                "Jumbo",
                vec![raw("Jumbo", "Duvel 4x33cl", 5.6, "")],
            )),
        ];
        let run = Orchestrator::new(scrapers, 5, Duration::from_secs(45))
            .run("duvel")
            .await;

        assert_eq!(run.outcomes.len(), 3);
        assert_eq!(run.outcomes.iter().filter(|o| o.success).count(), 2);
        let failed = run.outcomes.iter().find(|o| !o.success).unwrap();
        assert_eq!(failed.name, "Lidl");
        assert!(failed.error.as_deref().unwrap().contains("503"));
        // Products come only from the scrapers that succeeded.
        assert_eq!(run.products.len(), 2);
        assert!(run.products.iter().all(|p| p.store != "Lidl"));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_never_exceeds_the_admission_limit() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let scrapers: Vec<Arc<dyn StoreScraper>> = (0..10)
            .map(|i| {
                let mut s = FakeScraper::new(&format!("store-{i}"), Vec::new());
                s.delay = Duration::from_millis(50);
                s.running = Arc::clone(&running);
                s.peak = Arc::clone(&peak);
                Arc::new(s) as Arc<dyn StoreScraper>
            })
            .collect();

        let run = Orchestrator::new(scrapers, 3, Duration::from_secs(45))
            .run("duvel")
            .await;

        assert_eq!(run.outcomes.len(), 10);
        assert!(peak.load(Ordering::SeqCst) <= 3, "peak was {}", peak.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_scraper_becomes_a_failed_outcome() {
        let mut slow = FakeScraper::new("Colruyt", vec![raw("Colruyt", "Duvel", 1.5, "")]);
        slow.delay = Duration::from_secs(120);
        let scrapers: Vec<Arc<dyn StoreScraper>> = vec![
            Arc::new(slow),
            Arc::new(FakeScraper::new(
                "Aldi",
                vec![raw("Aldi", "Duvel 33cl", 1.5, "")],
            )),
        ];

        let run = Orchestrator::new(scrapers, 5, Duration::from_secs(45))
            .run("duvel")
            .await;

        assert_eq!(run.outcomes.len(), 2);
        let timed_out = run.outcomes.iter().find(|o| o.name == "Colruyt").unwrap();
        assert!(!timed_out.success);
        assert!(timed_out.error.as_deref().unwrap().contains("timed out"));
        // The slow store's products never make it in, the fast one's do.
        assert_eq!(run.products.len(), 1);
        assert_eq!(run.products[0].store, "Aldi");
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_scraper_becomes_a_failed_outcome_with_its_name() {
        let scrapers: Vec<Arc<dyn StoreScraper>> = vec![
            Arc::new(PanickingScraper {
                name: "Delhaize".to_string(),
            }),
            Arc::new(FakeScraper::new(
                "Aldi",
                vec![raw("Aldi", "Duvel 33cl", 1.5, "")],
            )),
        ];

        let run = Orchestrator::new(scrapers, 5, Duration::from_secs(45))
            .run("duvel")
            .await;

        assert_eq!(run.outcomes.len(), 2);
        let aborted = run.outcomes.iter().find(|o| !o.success).unwrap();
        assert_eq!(aborted.name, "Delhaize");
        assert_eq!(aborted.count, 0);
        assert!(aborted.error.is_some());
        // The sibling scraper is untouched.
        assert_eq!(run.products.len(), 1);
        assert_eq!(run.products[0].store, "Aldi");
    }

    #[tokio::test(start_paused = true)]
    async fn products_are_ranked_and_price_filtered() {
        let scrapers: Vec<Arc<dyn StoreScraper>> = vec![Arc::new(FakeScraper::new(
            "Aldi",
            vec![
                raw("Aldi", "Mystery box duvel", 9.99, ""),
                raw("Aldi", "Duvel 33cl", 1.98, ""),
                raw("Aldi", "Duvel gratis sample", 0.0, "33cl"),
                raw("Aldi", "Duvel vat 5l", 22.0, ""),
            ],
        ))];

        let run = Orchestrator::new(scrapers, 5, Duration::from_secs(45))
            .run("duvel")
            .await;

        // The free sample is gone, the volume-unknown box sorts last.
        assert_eq!(run.products.len(), 3);
        assert_eq!(run.products[0].name, "Duvel vat 5l");
        assert_eq!(run.products[1].name, "Duvel 33cl");
        assert_eq!(run.products[2].name, "Mystery box duvel");
    }
}
