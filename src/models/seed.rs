//! Source sites and crawl seeds.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::PropertyType;

/// The fixed set of listing sites the crawler knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Site {
    #[serde(rename = "chaves")]
    ChavesNaMao,
    #[serde(rename = "olx")]
    Olx,
    #[serde(rename = "vivareal")]
    VivaReal,
    #[serde(rename = "zap")]
    Zap,
}

impl Site {
    pub const ALL: [Site; 4] = [Site::ChavesNaMao, Site::Olx, Site::VivaReal, Site::Zap];

    /// Short identifier used in config files and record-set file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Site::ChavesNaMao => "chaves",
            Site::Olx => "olx",
            Site::VivaReal => "vivareal",
            Site::Zap => "zap",
        }
    }

    /// Human-readable origin label.
    pub fn label(&self) -> &'static str {
        match self {
            Site::ChavesNaMao => "Chaves na Mão",
            Site::Olx => "OLX",
            Site::VivaReal => "Viva Real",
            Site::Zap => "ZAP Imóveis",
        }
    }

    /// Look a site up by its slug (case-insensitive).
    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim().to_lowercase();
        Self::ALL.into_iter().find(|site| site.slug() == slug)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Index of a seed inside the crawl arena.
pub type SeedId = usize;

/// A single crawl starting point and its pagination state.
///
/// One seed exists per (site, property type) for sites that partition
/// listings by URL, or one per site for sites that mix types on a page.
/// The page counter is owned by the seed and only ever grows.
#[derive(Debug, Clone)]
pub struct CrawlSeed {
    pub id: SeedId,
    pub site: Site,
    pub allowed_domains: Vec<String>,
    /// Type assigned to every card of this seed, when the site partitions by URL
    pub property_type: Option<PropertyType>,
    pub start_url: Url,
    /// 1-based number of the page currently being processed
    pub page: u32,
    pub max_pages: u32,
}

impl CrawlSeed {
    pub fn new(
        id: SeedId,
        site: Site,
        allowed_domains: Vec<String>,
        property_type: Option<PropertyType>,
        start_url: Url,
        max_pages: u32,
    ) -> Self {
        Self {
            id,
            site,
            allowed_domains,
            property_type,
            start_url,
            page: 1,
            max_pages,
        }
    }

    /// Whether a URL stays inside this seed's allowed domains.
    ///
    /// An empty allow-list permits every host.
    pub fn allows(&self, url: &Url) -> bool {
        if self.allowed_domains.is_empty() {
            return true;
        }
        match url.host_str() {
            Some(host) => self
                .allowed_domains
                .iter()
                .any(|d| host == d || host.ends_with(&format!(".{d}"))),
            None => false,
        }
    }

    /// Short label for log lines.
    pub fn describe(&self) -> String {
        match self.property_type {
            Some(kind) => format!("{}/{}", self.site, kind),
            None => self.site.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(domains: &[&str]) -> CrawlSeed {
        CrawlSeed::new(
            0,
            Site::Zap,
            domains.iter().map(|d| d.to_string()).collect(),
            Some(PropertyType::House),
            Url::parse("https://www.zapimoveis.com.br/venda/casas/ce+fortaleza/").unwrap(),
            500,
        )
    }

    #[test]
    fn test_site_slug_roundtrip() {
        for site in Site::ALL {
            assert_eq!(Site::from_slug(site.slug()), Some(site));
        }
        assert_eq!(Site::from_slug("ZAP"), Some(Site::Zap));
        assert_eq!(Site::from_slug("lopes"), None);
    }

    #[test]
    fn test_allowed_domains() {
        let s = seed(&["www.zapimoveis.com.br"]);
        assert!(s.allows(&Url::parse("https://www.zapimoveis.com.br/x").unwrap()));
        assert!(!s.allows(&Url::parse("https://tracker.example.com/x").unwrap()));
        assert!(seed(&[]).allows(&Url::parse("https://anything.test/").unwrap()));
    }

    #[test]
    fn test_new_seed_starts_at_page_one() {
        let s = seed(&[]);
        assert_eq!(s.page, 1);
        assert_eq!(s.describe(), "zap/house");
    }
}
