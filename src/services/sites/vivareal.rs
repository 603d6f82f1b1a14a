//! Viva Real adapter.
//!
//! Viva Real and ZAP run on the same listing platform and share their card
//! internals; only the card container differs. Both partition by type via
//! URL and paginate with the `pagina` query parameter.

use scraper::Selector;

use crate::error::Result;
use crate::models::{PropertyType, RawListingRecord, Site};
use crate::services::normalize::{clean_area, clean_price, clean_text, truncate_address};
use crate::services::pagination::{PageTemplate, PaginationPolicy};

use super::{Card, SiteAdapter, parse_selector};

const CARD: &str = r#"li[data-cy="rp-property-cd"]"#;
const PAGE_PARAM: &str = "pagina";

/// Card internals shared by the Viva Real and ZAP layouts.
pub(super) struct PlatformCard {
    amenities: Selector,
    location: Selector,
    values: Selector,
}

impl PlatformCard {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            amenities: parse_selector(
                "ul.flex.flex-row.text-1-75.text-neutral-110.text-nowrap.gap-3 li h3",
            )?,
            location: parse_selector(r#"h2[data-cy="rp-cardProperty-location-txt"]"#)?,
            values: parse_selector("div.shrink.grow.text-nowrap.min-w-0 p")?,
        })
    }

    pub(super) fn pagination() -> PaginationPolicy {
        PaginationPolicy::index_increment(PageTemplate::Query(PAGE_PARAM.into()))
    }

    /// Amenities read area, rooms, bathrooms, parking; values read price
    /// then condo fee. The location's last text node is "Bairro, Cidade".
    pub(super) fn read(&self, card: &Card<'_>, seed_type: Option<PropertyType>) -> RawListingRecord {
        let amenities = card.trimmed_texts(&self.amenities);
        let amenity = |i: usize| amenities.get(i).map(String::as_str);

        let location = card.trimmed_texts(&self.location).pop();
        let values = card.texts(&self.values);
        let value = |i: usize| values.get(i).map(String::as_str);

        RawListingRecord {
            property_type: seed_type,
            location: truncate_address(location.as_deref()),
            area: clean_area(amenity(0)),
            rooms: clean_text(amenity(1)),
            bathrooms: clean_text(amenity(2)),
            parking_spots: clean_text(amenity(3)),
            price: clean_price(value(0)),
            condo_fee: clean_price(value(1)),
        }
    }
}

pub struct VivaRealAdapter {
    card: Selector,
    layout: PlatformCard,
    pagination: PaginationPolicy,
}

impl VivaRealAdapter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            card: parse_selector(CARD)?,
            layout: PlatformCard::new()?,
            pagination: PlatformCard::pagination(),
        })
    }
}

impl SiteAdapter for VivaRealAdapter {
    fn site(&self) -> Site {
        Site::VivaReal
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
