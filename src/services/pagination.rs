//! Pagination controller.
//!
//! Decides, after a page has been processed, whether a seed continues and
//! with which URL. Two policies exist, chosen per site:
//!
//! - **Link-follow**: continue with the page's explicit "next" link.
//! - **Index-increment**: build page N+1 from a URL template.
//!
//! Both stop at the seed's page ceiling and on a page without listings.

use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::CrawlSeed;
use crate::utils::resolve_url;

/// How page N+1's URL is derived from the seed's start URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTemplate {
    /// Set a query parameter, e.g. `?pagina=2`
    Query(String),
    /// Append a path segment with `{page}` substituted, e.g. `pagina-2/`
    PathSuffix(String),
}

impl PageTemplate {
    /// URL of `page` for a seed starting at `start`.
    pub fn page_url(&self, start: &Url, page: u32) -> Url {
        let mut url = start.clone();
        match self {
            PageTemplate::Query(name) => {
                let kept: Vec<(String, String)> = start
                    .query_pairs()
                    .filter(|(k, _)| k != name.as_str())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(kept)
                    .append_pair(name, &page.to_string());
            }
            PageTemplate::PathSuffix(pattern) => {
                let mut path = start.path().to_string();
                if !path.ends_with('/') {
                    path.push('/');
                }
                path.push_str(&pattern.replace("{page}", &page.to_string()));
                url.set_path(&path);
            }
        }
        url
    }
}

/// Per-site pagination policy.
#[derive(Debug, Clone)]
pub enum PaginationPolicy {
    LinkFollow { next: Selector },
    IndexIncrement { template: PageTemplate },
}

impl PaginationPolicy {
    /// Follow the first element matching `selector` and read its `href`.
    pub fn link_follow(selector: &str) -> Result<Self> {
        let next = Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        Ok(Self::LinkFollow { next })
    }

    pub fn index_increment(template: PageTemplate) -> Self {
        Self::IndexIncrement { template }
    }

    /// Candidate URL for the page after `seed.page`, before ceiling and
    /// domain checks.
    pub fn candidate(&self, document: &Html, page_url: &Url, seed: &CrawlSeed) -> Option<Url> {
        match self {
            PaginationPolicy::LinkFollow { next } => {
                let href = document
                    .select(next)
                    .find_map(|el| el.value().attr("href"))?
                    .trim();
                if href.is_empty() {
                    return None;
                }
                Url::parse(&resolve_url(page_url, href)).ok()
            }
            PaginationPolicy::IndexIncrement { template } => {
                Some(template.page_url(&seed.start_url, seed.page + 1))
            }
        }
    }
}

/// Why a seed stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The page had no listing cards
    NoListings,
    /// The seed reached its page ceiling
    Ceiling,
    /// Link-follow found no next link
    NoNextLink,
    /// The next link points outside the allowed domains
    Offsite,
}

/// Outcome of a pagination decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    Next(Url),
    Stop(StopReason),
}

/// Applies the stop conditions shared by every policy.
pub struct PaginationController;

impl PaginationController {
    /// Decide what follows the seed's current page.
    ///
    /// Advances the seed's page counter only when continuing, so the
    /// counter equals the number of pages requested for the seed.
    pub fn decide(seed: &mut CrawlSeed, card_count: usize, candidate: Option<Url>) -> Continuation {
        if card_count == 0 {
            return Continuation::Stop(StopReason::NoListings);
        }
        if seed.page >= seed.max_pages {
            return Continuation::Stop(StopReason::Ceiling);
        }
        let Some(next) = candidate else {
            return Continuation::Stop(StopReason::NoNextLink);
        };
        if !seed.allows(&next) {
            return Continuation::Stop(StopReason::Offsite);
        }
        seed.page += 1;
        Continuation::Next(next)
    }
}
