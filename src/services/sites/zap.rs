//! ZAP Imóveis adapter.

use scraper::Selector;

use crate::error::Result;
use crate::models::{PropertyType, RawListingRecord, Site};
use crate::services::pagination::PaginationPolicy;

use super::vivareal::PlatformCard;
use super::{Card, SiteAdapter, parse_selector};

const CARD: &str = "div.flex.flex-col.content-stretch";

pub struct ZapAdapter {
    card: Selector,
    layout: PlatformCard,
    pagination: PaginationPolicy,
}

impl ZapAdapter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            card: parse_selector(CARD)?,
            layout: PlatformCard::new()?,
            pagination: PlatformCard::pagination(),
        })
    }
}

impl SiteAdapter for ZapAdapter {
    fn site(&self) -> Site {
        Site::Zap
    }

    fn card_selector(&self) -> &Selector {
        &self.card
    }

    fn pagination(&self) -> &PaginationPolicy {
        &self.pagination
    }

    fn extract_card(&self, card: &Card<'_>, seed_type: Option<PropertyType>) -> RawListingRecord {
        self.layout.read(card, seed_type)
    }
}
