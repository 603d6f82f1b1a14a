//! Site adapters.
//!
//! Each supported site has one adapter that knows its listing-card markup
//! and its pagination policy. Adapters are selected by [`Site`] from static
//! configuration; none of them hold mutable state, so one instance serves
//! every seed of its site concurrently.

mod chaves;
mod olx;
mod vivareal;
mod zap;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CrawlSeed, PropertyType, RawListingRecord, Site};

use super::pagination::PaginationPolicy;

pub use chaves::ChavesAdapter;
pub use olx::OlxAdapter;
pub use vivareal::VivaRealAdapter;
pub use zap::ZapAdapter;

/// Extraction and pagination capability shared by all site variants.
pub trait SiteAdapter: Send + Sync {
    fn site(&self) -> Site;

    /// Selector for the repeated listing-card element.
    fn card_selector(&self) -> &Selector;

    fn pagination(&self) -> &PaginationPolicy;

    /// Read one card. Missing sub-elements leave their field `None`.
    ///
    /// `seed_type` is the property type of the seed's URL partition, for
    /// sites that split listings by type.
    fn extract_card(&self, card: &Card<'_>, seed_type: Option<PropertyType>) -> RawListingRecord;

    /// Every listing card on a page, in document order.
    fn extract_listings(
        &self,
        document: &Html,
        seed_type: Option<PropertyType>,
    ) -> Vec<RawListingRecord> {
        document
            .select(self.card_selector())
            .map(|el| self.extract_card(&Card::new(el), seed_type))
            .collect()
    }

    /// Candidate URL for the seed's next page.
    fn next_page(&self, document: &Html, page_url: &Url, seed: &CrawlSeed) -> Option<Url> {
        self.pagination().candidate(document, page_url, seed)
    }
}

/// Build the adapter for a site.
pub fn adapter_for(site: Site) -> Result<Box<dyn SiteAdapter>> {
    Ok(match site {
        Site::ChavesNaMao => Box::new(ChavesAdapter::new()?),
        Site::Olx => Box::new(OlxAdapter::new()?),
        Site::VivaReal => Box::new(VivaRealAdapter::new()?),
        Site::Zap => Box::new(ZapAdapter::new()?),
    })
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// A listing card with positional text lookups.
pub struct Card<'a> {
    element: ElementRef<'a>,
}

impl<'a> Card<'a> {
    pub fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Direct text nodes of every element matching `selector`, in order.
    ///
    /// Whitespace-only nodes are kept so positional indices line up with
    /// the markup.
    pub fn texts(&self, selector: &Selector) -> Vec<String> {
        self.element
            .select(selector)
            .flat_map(|el| {
                el.children()
                    .filter_map(|node| node.value().as_text().map(|t| String::from(&**t)))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Like [`Card::texts`] but trimmed, with blank entries dropped.
    pub fn trimmed_texts(&self, selector: &Selector) -> Vec<String> {
        self.texts(selector)
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// The `index`-th direct text node, if present.
    pub fn text_at(&self, selector: &Selector, index: usize) -> Option<String> {
        self.texts(selector).into_iter().nth(index)
    }

    /// All text under the first element matching `selector`.
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        self.element
            .select(selector)
            .next()
            .map(|el| el.text().collect::<String>())
    }
}
