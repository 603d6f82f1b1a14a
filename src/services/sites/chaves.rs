//! Chaves na Mão adapter.
//!
//! Listings are partitioned by type through distinct URLs, so the property
//! type comes from the seed. Pagination follows the `rel="next"` link.

use scraper::Selector;

use crate::error::Result;
use crate::models::{PropertyType, RawListingRecord, Site};
use crate::services::normalize::{clean_area, clean_price, clean_text, truncate_address};
use crate::services::pagination::PaginationPolicy;

use super::{Card, SiteAdapter, parse_selector};

const CARD: &str = "span.card-module__1awNxG__cardContent";
const ADDRESS: &str = "address.style-module__PkTDxW__address p";
const FEATURES: &str = "span.style-module__PkTDxW__list p";
const CONDO: &str = "p.column.style-module__PkTDxW__price small";
const PRICE: &str = "p b";
const NEXT: &str = r#"a[rel="next"]"#;

// Feature paragraphs alternate label and value.
const AREA_AT: usize = 1;
const ROOMS_AT: usize = 3;
const PARKING_AT: usize = 5;
const BATHROOMS_AT: usize = 7;

pub struct ChavesAdapter {
    card: Selector,
    address: Selector,
    features: Selector,
    condo: Selector,
    price: Selector,
    pagination: PaginationPolicy,
}

impl ChavesAdapter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            card: parse_selector(CARD)?,
            address: parse_selector(ADDRESS)?,
            features: parse_selector(FEATURES)?,
            condo: parse_selector(CONDO)?,
            price: parse_selector(PRICE)?,
            pagination: PaginationPolicy::link_follow(NEXT)?,
        })
    }
}

impl SiteAdapter for ChavesAdapter {
    fn site(&self) -> Site {
        Site::ChavesNaMao
    }

    fn card_selector(&self) -> &Selector {
        &self.card
    }

    fn pagination(&self) -> &PaginationPolicy {
        &self.pagination
    }

    fn extract_card(&self, card: &Card<'_>, seed_type: Option<PropertyType>) -> RawListingRecord {
        let features = card.texts(&self.features);
        let feature = |i: usize| clean_text(features.get(i).map(String::as_str));

        RawListingRecord {
            property_type: seed_type,
            location: truncate_address(card.text_at(&self.address, 1).as_deref()),
            area: clean_area(features.get(AREA_AT).map(String::as_str)),
            rooms: feature(ROOMS_AT),
            bathrooms: feature(BATHROOMS_AT),
            parking_spots: feature(PARKING_AT),
            price: clean_price(card.first_text(&self.price).as_deref()),
            condo_fee: clean_price(card.text_at(&self.condo, 1).as_deref()),
        }
    }
}
