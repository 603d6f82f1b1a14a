//! OLX adapter.
//!
//! OLX mixes property types on one results URL, so the type is parsed from
//! the card title. Pages are addressed by the `o` query parameter.

use scraper::Selector;

use crate::error::Result;
use crate::models::{PropertyType, RawListingRecord, Site};
use crate::services::normalize::{clean_area, clean_price, clean_text};
use crate::services::pagination::{PageTemplate, PaginationPolicy};

use super::{Card, SiteAdapter, parse_selector};

const CARD: &str = "div.olx-adcard__content";
const TITLE: &str = "h2.olx-adcard__title";
const LOCATION: &str = "div.olx-adcard__location-date p";
const DETAILS: &str = "div.olx-adcard__details div";
const PRICE_INFO: &str = "div.olx-adcard__price-info";
const PRICE: &str = "h3.olx-adcard__price";
const PAGE_PARAM: &str = "o";

pub struct OlxAdapter {
    card: Selector,
    title: Selector,
    location: Selector,
    details: Selector,
    price_info: Selector,
    price: Selector,
    pagination: PaginationPolicy,
}

impl OlxAdapter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            card: parse_selector(CARD)?,
            title: parse_selector(TITLE)?,
            location: parse_selector(LOCATION)?,
            details: parse_selector(DETAILS)?,
            price_info: parse_selector(PRICE_INFO)?,
            price: parse_selector(PRICE)?,
            pagination: PaginationPolicy::index_increment(PageTemplate::Query(PAGE_PARAM.into())),
        })
    }
}

impl SiteAdapter for OlxAdapter {
    fn site(&self) -> Site {
        Site::Olx
    }

    fn card_selector(&self) -> &Selector {
        &self.card
    }

    fn pagination(&self) -> &PaginationPolicy {
        &self.pagination
    }

    fn extract_card(&self, card: &Card<'_>, seed_type: Option<PropertyType>) -> RawListingRecord {
        let title = card.first_text(&self.title);
        let property_type = title
            .as_deref()
            .and_then(PropertyType::from_label)
            .or(seed_type);
        if property_type.is_none() {
            log::debug!("OLX card without a recognizable type: {title:?}");
        }

        // Details render as rooms, area, parking, bathrooms with blanks between.
        let details = card.trimmed_texts(&self.details);
        let detail = |i: usize| details.get(i).map(String::as_str);

        RawListingRecord {
            property_type,
            location: clean_text(card.text_at(&self.location, 1).as_deref()),
            area: clean_area(detail(1)),
            rooms: clean_text(detail(0)),
            bathrooms: clean_text(detail(3)),
            parking_spots: clean_text(detail(2)),
            price: clean_price(card.first_text(&self.price).as_deref()),
            condo_fee: clean_price(card.text_at(&self.price_info, 1).as_deref()),
        }
    }
}
