// src/services/listings.rs

//! Listing crawler service.
//!
//! Seeds live in an arena indexed by [`SeedId`]. Work is an explicit queue
//! of `(seed, url)` page tasks drained by a bounded set of in-flight
//! fetches. A seed has at most one task queued or in flight: its next page
//! is only enqueued once the current page has been processed.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use scraper::Html;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, CrawlSeed, RawListingRecord, SeedId, Site};
use crate::utils::http::PageFetcher;

use super::pagination::{Continuation, PaginationController, StopReason};
use super::sites::{SiteAdapter, adapter_for};

/// One page request of one seed.
#[derive(Debug, Clone)]
struct PageTask {
    seed: SeedId,
    url: Url,
}

/// Summary of a crawl run.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Records per site; order across seeds of a site is not meaningful
    pub records: BTreeMap<Site, Vec<RawListingRecord>>,
    pub seed_total: usize,
    /// Seeds ended early by a page fetch failure
    pub seed_failures: usize,
    pub pages_fetched: usize,
    /// Pages requested per seed, indexed by seed id
    pub pages_per_seed: Vec<u32>,
}

impl CrawlOutcome {
    pub fn record_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}

/// Build the seed arena for the enabled sites, optionally restricted to `only`.
pub fn build_seeds(config: &Config, only: &[Site]) -> Result<Vec<CrawlSeed>> {
    let mut seeds = Vec::new();
    for site in config.sites.iter().filter(|s| s.enabled) {
        if !only.is_empty() && !only.contains(&site.site) {
            continue;
        }
        for seed in &site.seeds {
            let start_url = Url::parse(&seed.url)?;
            seeds.push(CrawlSeed::new(
                seeds.len(),
                site.site,
                site.allowed_domains.clone(),
                seed.property_type,
                start_url,
                site.max_pages,
            ));
        }
    }
    Ok(seeds)
}

/// Service for crawling listing pages from every configured site.
pub struct ListingCrawler {
    fetcher: Box<dyn PageFetcher>,
    adapters: HashMap<Site, Box<dyn SiteAdapter>>,
    max_concurrent: usize,
    delay: Duration,
}

impl ListingCrawler {
    /// Create a crawler with an adapter for every known site.
    pub fn new(config: &Config, fetcher: Box<dyn PageFetcher>) -> Result<Self> {
        let adapters = Site::ALL
            .into_iter()
            .map(|site| adapter_for(site).map(|adapter| (site, adapter)))
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self {
            fetcher,
            adapters,
            max_concurrent: config.crawler.max_concurrent.max(1),
            delay: Duration::from_millis(config.crawler.request_delay_ms),
        })
    }

    /// Crawl every seed to termination.
    ///
    /// A failed page fetch ends only its own seed. Seed ids are reassigned
    /// to their position in `seeds`.
    pub async fn crawl(&self, mut seeds: Vec<CrawlSeed>) -> CrawlOutcome {
        for (position, seed) in seeds.iter_mut().enumerate() {
            seed.id = position;
        }
        let mut outcome = CrawlOutcome {
            seed_total: seeds.len(),
            pages_per_seed: vec![0; seeds.len()],
            ..CrawlOutcome::default()
        };

        let mut queue: VecDeque<PageTask> = seeds
            .iter()
            .map(|seed| PageTask {
                seed: seed.id,
                url: seed.start_url.clone(),
            })
            .collect();
        let mut in_flight = FuturesUnordered::new();

        loop {
            while in_flight.len() < self.max_concurrent {
                let Some(task) = queue.pop_front() else {
                    break;
                };
                outcome.pages_per_seed[task.seed] += 1;
                let fetcher = &self.fetcher;
                in_flight.push(async move {
                    let result = fetcher.fetch(task.url.as_str()).await;
                    (task, result)
                });
            }

            let Some((task, result)) = in_flight.next().await else {
                break;
            };
            let seed = &mut seeds[task.seed];

            let body = match result {
                Ok(body) => body,
                Err(error) => {
                    outcome.seed_failures += 1;
                    log::warn!(
                        "Seed {} stopped at page {} ({}): {}",
                        seed.describe(),
                        seed.page,
                        task.url,
                        error
                    );
                    continue;
                }
            };
            outcome.pages_fetched += 1;

            match self.process_page(seed, &task.url, &body) {
                Ok((records, continuation)) => {
                    log::debug!(
                        "{} page {}: {} listings",
                        seed.describe(),
                        seed.page,
                        records.len()
                    );
                    outcome.records.entry(seed.site).or_default().extend(records);
                    match continuation {
                        Continuation::Next(url) => queue.push_back(PageTask { seed: seed.id, url }),
                        Continuation::Stop(reason) => log_stop(seed, reason),
                    }
                }
                Err(error) => {
                    outcome.seed_failures += 1;
                    log::warn!("Seed {} aborted: {}", seed.describe(), error);
                }
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        outcome
    }

    /// Extract a fetched page and decide the seed's continuation.
    fn process_page(
        &self,
        seed: &mut CrawlSeed,
        page_url: &Url,
        body: &str,
    ) -> Result<(Vec<RawListingRecord>, Continuation)> {
        let adapter = self
            .adapters
            .get(&seed.site)
            .ok_or_else(|| AppError::crawl(seed.describe(), "no adapter registered"))?;

        let document = Html::parse_document(body);
        let records = adapter.extract_listings(&document, seed.property_type);
        let candidate = adapter.next_page(&document, page_url, seed);
        let continuation = PaginationController::decide(seed, records.len(), candidate);
        Ok((records, continuation))
    }
}

fn log_stop(seed: &CrawlSeed, reason: StopReason) {
    match reason {
        StopReason::NoListings => log::info!(
            "{} finished: page {} had no listings",
            seed.describe(),
            seed.page
        ),
        StopReason::Ceiling => log::info!(
            "{} finished: reached the {}-page ceiling",
            seed.describe(),
            seed.max_pages
        ),
        StopReason::NoNextLink => log::info!(
            "{} finished: no next link after page {}",
            seed.describe(),
            seed.page
        ),
        StopReason::Offsite => log::warn!(
            "{} finished: next link left the allowed domains",
            seed.describe()
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::models::{PropertyType, SeedUrl};

    /// Serves canned pages and records every requested URL.
    #[derive(Clone, Default)]
    struct FakeFetcher {
        pages: HashMap<String, String>,
        fallback: Option<String>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl FakeFetcher {
        fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .or(self.fallback.as_ref())
                .cloned()
                .ok_or_else(|| AppError::crawl(url, "HTTP status 503"))
        }
    }

    const OLX_CARD: &str = r#"<div class="olx-adcard__content">
        <h2 class="olx-adcard__title">Casa à venda</h2>
        <h3 class="olx-adcard__price">R$ 200.000</h3></div>"#;

    fn chaves_card(price: &str) -> String {
        format!(
            r#"<span class="card-module__1awNxG__cardContent"><p><b>{price}</b></p></span>"#
        )
    }

    fn config_for(site: Site, max_pages: u32, urls: &[(Option<PropertyType>, &str)]) -> Config {
        let mut config = Config::default();
        config.crawler.request_delay_ms = 0;
        config.crawler.max_concurrent = 3;
        config.sites.retain(|s| s.site == site);
        config.sites[0].max_pages = max_pages;
        config.sites[0].seeds = urls
            .iter()
            .map(|(kind, url)| SeedUrl {
                property_type: *kind,
                url: url.to_string(),
            })
            .collect();
        config
    }

    async fn run(config: &Config, fetcher: &FakeFetcher) -> CrawlOutcome {
        let crawler = ListingCrawler::new(config, Box::new(fetcher.clone())).unwrap();
        let seeds = build_seeds(config, &[]).unwrap();
        crawler.crawl(seeds).await
    }

    #[tokio::test]
    async fn test_index_increment_requests_exactly_ceiling() {
        let start = "https://www.olx.com.br/imoveis/venda/estado-ce/fortaleza";
        let config = config_for(Site::Olx, 5, &[(None, start)]);
        let fetcher = FakeFetcher {
            fallback: Some(OLX_CARD.to_string()),
            ..FakeFetcher::default()
        };

        let outcome = run(&config, &fetcher).await;
        let requested = fetcher.requested();

        assert_eq!(requested.len(), 5);
        assert_eq!(requested[0], start);
        assert_eq!(requested[4], format!("{start}?o=5"));
        assert!(!requested.iter().any(|u| u.ends_with("o=6")));
        assert_eq!(outcome.pages_per_seed, vec![5]);
        assert_eq!(outcome.record_count(), 5);
        assert_eq!(
            outcome.records[&Site::Olx][0].property_type,
            Some(PropertyType::House)
        );
    }

    #[tokio::test]
    async fn test_link_follow_stops_without_next_link() {
        let page1 = "https://www.chavesnamao.com.br/casas-a-venda/ce-fortaleza/";
        let page2 = "https://www.chavesnamao.com.br/casas-a-venda/ce-fortaleza/?pg=2";
        let config = config_for(Site::ChavesNaMao, 99, &[(Some(PropertyType::House), page1)]);
        let mut pages = HashMap::new();
        pages.insert(
            page1.to_string(),
            format!(r#"{}<a rel="next" href="?pg=2">next</a>"#, chaves_card("R$ 1.000")),
        );
        pages.insert(page2.to_string(), chaves_card("R$ 2.000"));
        let fetcher = FakeFetcher {
            pages,
            ..FakeFetcher::default()
        };

        let outcome = run(&config, &fetcher).await;

        assert_eq!(fetcher.requested(), vec![page1.to_string(), page2.to_string()]);
        let prices: Vec<_> = outcome.records[&Site::ChavesNaMao]
            .iter()
            .map(|r| r.price.clone().unwrap())
            .collect();
        assert_eq!(prices, vec!["1000", "2000"]);
        assert!(
            outcome.records[&Site::ChavesNaMao]
                .iter()
                .all(|r| r.property_type == Some(PropertyType::House))
        );
    }

    #[tokio::test]
    async fn test_link_follow_respects_ceiling() {
        let page1 = "https://www.chavesnamao.com.br/a/";
        let config = config_for(Site::ChavesNaMao, 1, &[(None, page1)]);
        let fetcher = FakeFetcher {
            fallback: Some(format!(r#"{}<a rel="next" href="?pg=2">next</a>"#, chaves_card("R$ 1"))),
            ..FakeFetcher::default()
        };

        run(&config, &fetcher).await;
        assert_eq!(fetcher.requested(), vec![page1.to_string()]);
    }

    #[tokio::test]
    async fn test_empty_page_stops_seed() {
        let start = "https://www.olx.com.br/imoveis";
        let config = config_for(Site::Olx, 100, &[(None, start)]);
        let mut pages = HashMap::new();
        pages.insert(start.to_string(), OLX_CARD.to_string());
        pages.insert(format!("{start}?o=2"), "<p>Nenhum anúncio</p>".to_string());
        let fetcher = FakeFetcher {
            pages,
            ..FakeFetcher::default()
        };

        let outcome = run(&config, &fetcher).await;
        assert_eq!(fetcher.requested().len(), 2);
        assert_eq!(outcome.record_count(), 1);
        assert_eq!(outcome.seed_failures, 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_ends_only_that_seed() {
        let ok = "https://www.zapimoveis.com.br/venda/casas/";
        let broken = "https://www.zapimoveis.com.br/venda/apartamentos/";
        let config = config_for(
            Site::Zap,
            2,
            &[(Some(PropertyType::House), ok), (Some(PropertyType::Apartment), broken)],
        );
        let card = r#"<div class="flex flex-col content-stretch">
            <div class="shrink grow text-nowrap min-w-0"><p>R$ 500.000</p></div></div>"#;
        let mut pages = HashMap::new();
        pages.insert(ok.to_string(), card.to_string());
        pages.insert(format!("{ok}?pagina=2"), card.to_string());
        let fetcher = FakeFetcher {
            pages,
            ..FakeFetcher::default()
        };

        let outcome = run(&config, &fetcher).await;
        assert_eq!(outcome.seed_total, 2);
        assert_eq!(outcome.seed_failures, 1);
        assert_eq!(outcome.pages_fetched, 2);
        assert_eq!(outcome.record_count(), 2);
        assert_eq!(outcome.pages_per_seed, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_seed_ids_follow_arena_position() {
        let start = "https://www.olx.com.br/imoveis";
        let config = config_for(Site::Olx, 2, &[(None, start)]);
        let fetcher = FakeFetcher {
            fallback: Some(OLX_CARD.to_string()),
            ..FakeFetcher::default()
        };
        let seeds = vec![
            CrawlSeed::new(7, Site::Olx, vec![], None, Url::parse(start).unwrap(), 2),
            CrawlSeed::new(42, Site::Olx, vec![], None, Url::parse(start).unwrap(), 1),
        ];

        let crawler = ListingCrawler::new(&config, Box::new(fetcher.clone())).unwrap();
        let outcome = crawler.crawl(seeds).await;

        assert_eq!(outcome.pages_per_seed, vec![2, 1]);
        assert_eq!(outcome.record_count(), 3);
    }

    #[test]
    fn test_build_seeds_skips_disabled_and_filters() {
        let mut config = Config::default();
        config.sites[1].enabled = false;

        let all = build_seeds(&config, &[]).unwrap();
        assert_eq!(all.len(), 9);
        assert!(all.iter().all(|s| s.site != Site::Olx));
        assert!(all.iter().enumerate().all(|(i, s)| s.id == i && s.page == 1));

        let zap = build_seeds(&config, &[Site::Zap]).unwrap();
        assert_eq!(zap.len(), 3);
        assert_eq!(zap[0].max_pages, 500);
    }
}
