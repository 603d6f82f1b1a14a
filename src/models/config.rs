//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils::get_domain;

use super::{PropertyType, Site};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Where record sets and store files live
    #[serde(default)]
    pub paths: PathsConfig,

    /// Store table naming
    #[serde(default)]
    pub store: StoreConfig,

    /// Per-site seeds and page ceilings
    #[serde(default = "defaults::sites")]
    pub sites: Vec<SiteConfig>,

    /// Filename keyword to origin label, scanned in order
    #[serde(default = "defaults::origins")]
    pub origins: Vec<OriginKeyword>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.store.schema_prefix.trim().is_empty() {
            return Err(AppError::validation("store.schema_prefix is empty"));
        }
        if self.sites.is_empty() {
            return Err(AppError::validation("No sites defined"));
        }

        let mut seen = HashSet::new();
        for site in &self.sites {
            if !seen.insert(site.site) {
                return Err(AppError::validation(format!(
                    "Site '{}' is configured more than once",
                    site.site
                )));
            }
            if site.max_pages == 0 {
                return Err(AppError::validation(format!(
                    "sites.{}.max_pages must be > 0",
                    site.site
                )));
            }
            if site.seeds.is_empty() {
                return Err(AppError::validation(format!(
                    "sites.{} has no seeds",
                    site.site
                )));
            }
            for seed in &site.seeds {
                let domain = get_domain(&seed.url).ok_or_else(|| {
                    AppError::validation(format!("sites.{} seed '{}' is not a URL", site.site, seed.url))
                })?;
                if !site.allowed_domains.is_empty() && !site.allowed_domains.contains(&domain) {
                    return Err(AppError::validation(format!(
                        "sites.{} seed host '{domain}' is not in allowed_domains",
                        site.site
                    )));
                }
            }
        }

        if self
            .origins
            .iter()
            .any(|o| o.keyword.trim().is_empty() || o.label.trim().is_empty())
        {
            return Err(AppError::validation("origins entries need a keyword and a label"));
        }
        Ok(())
    }

    /// Configuration for one site, if present.
    pub fn site(&self, site: Site) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.site == site)
    }

    /// Ordered (keyword, label) pairs for origin resolution.
    pub fn origin_mapping(&self) -> Vec<(String, String)> {
        self.origins
            .iter()
            .map(|o| (o.keyword.to_lowercase(), o.label.clone()))
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            paths: PathsConfig::default(),
            store: StoreConfig::default(),
            sites: defaults::sites(),
            origins: defaults::origins(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent requests
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Extra attempts for a failed page fetch
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            max_retries: defaults::max_retries(),
        }
    }
}

/// Filesystem locations, relative to the storage directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Record sets, laid out as `{raw_dir}/{period}/{site}.json`
    #[serde(default = "defaults::raw_dir")]
    pub raw_dir: PathBuf,

    /// SQLite files, one per schema
    #[serde(default = "defaults::store_dir")]
    pub store_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: defaults::raw_dir(),
            store_dir: defaults::store_dir(),
        }
    }
}

impl PathsConfig {
    pub fn raw_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.raw_dir)
    }

    pub fn store_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.store_dir)
    }
}

/// Store table naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Schema prefix; the year is appended per period
    #[serde(default = "defaults::schema_prefix")]
    pub schema_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            schema_prefix: defaults::schema_prefix(),
        }
    }
}

/// Crawl settings for one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub site: Site,

    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Hosts the crawl may follow links into
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    /// Hard page ceiling per seed
    pub max_pages: u32,

    /// Start URLs, optionally tagged with the property type they list
    pub seeds: Vec<SeedUrl>,
}

/// A start URL and the property type it lists, if the site partitions by type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUrl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    pub url: String,
}

/// Filename keyword mapped to an origin label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginKeyword {
    pub keyword: String,
    pub label: String,
}

mod defaults {
    use std::path::PathBuf;

    use super::{OriginKeyword, PropertyType, SeedUrl, Site, SiteConfig};

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; listings/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        250
    }
    pub fn max_concurrent() -> usize {
        8
    }
    pub fn max_retries() -> u32 {
        2
    }

    // Path defaults
    pub fn raw_dir() -> PathBuf {
        PathBuf::from("raw")
    }
    pub fn store_dir() -> PathBuf {
        PathBuf::from("store")
    }

    pub fn schema_prefix() -> String {
        "imoveis".into()
    }

    pub fn enabled() -> bool {
        true
    }

    fn typed(kind: PropertyType, url: &str) -> SeedUrl {
        SeedUrl {
            property_type: Some(kind),
            url: url.to_string(),
        }
    }

    // Site defaults
    pub fn sites() -> Vec<SiteConfig> {
        use PropertyType::{Apartment, Condo, House};

        vec![
            SiteConfig {
                site: Site::ChavesNaMao,
                enabled: true,
                allowed_domains: vec!["www.chavesnamao.com.br".into()],
                max_pages: 99,
                seeds: vec![
                    typed(House, "https://www.chavesnamao.com.br/casas-a-venda/ce-fortaleza/"),
                    typed(Apartment, "https://www.chavesnamao.com.br/apartamentos-a-venda/ce-fortaleza/"),
                    typed(Condo, "https://www.chavesnamao.com.br/casas-em-condominio-a-venda/ce-fortaleza/"),
                ],
            },
            SiteConfig {
                site: Site::Olx,
                enabled: true,
                allowed_domains: vec!["www.olx.com.br".into()],
                max_pages: 100,
                seeds: vec![SeedUrl {
                    property_type: None,
                    url: "https://www.olx.com.br/imoveis/venda/estado-ce/fortaleza".into(),
                }],
            },
            SiteConfig {
                site: Site::VivaReal,
                enabled: true,
                allowed_domains: vec!["www.vivareal.com.br".into()],
                max_pages: 50,
                seeds: vec![
                    typed(Apartment, "https://www.vivareal.com.br/venda/ceara/fortaleza/apartamento_residencial"),
                    typed(House, "https://www.vivareal.com.br/venda/ceara/fortaleza/casa_residencial"),
                    typed(Condo, "https://www.vivareal.com.br/venda/ceara/fortaleza/condominio_residencial"),
                ],
            },
            SiteConfig {
                site: Site::Zap,
                enabled: true,
                allowed_domains: vec!["www.zapimoveis.com.br".into()],
                max_pages: 500,
                seeds: vec![
                    typed(House, "https://www.zapimoveis.com.br/venda/casas/ce+fortaleza/"),
                    typed(Apartment, "https://www.zapimoveis.com.br/venda/apartamentos/ce+fortaleza/"),
                    typed(Condo, "https://www.zapimoveis.com.br/venda/casas-de-condominio/ce+fortaleza/"),
                ],
            },
        ]
    }

    // Origin defaults
    pub fn origins() -> Vec<OriginKeyword> {
        [
            ("chaves", "Chaves na Mão"),
            ("zap", "ZAP Imóveis"),
            ("vivareal", "Viva Real"),
            ("olx", "OLX"),
            ("lopes", "Imobiliária Lopes"),
        ]
        .into_iter()
        .map(|(keyword, label)| OriginKeyword {
            keyword: keyword.into(),
            label: label.into(),
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_ceiling() {
        let mut config = Config::default();
        config.sites[0].max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_seed_outside_allowed_domains() {
        let mut config = Config::default();
        config.sites[0].seeds[0].url = "https://www.example.com/casas".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_site() {
        let mut config = Config::default();
        let dup = config.sites[1].clone();
        config.sites.push(dup);
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_ceilings_match_sites() {
        let config = Config::default();
        let ceiling = |site| config.site(site).map(|s| s.max_pages);
        assert_eq!(ceiling(Site::ChavesNaMao), Some(99));
        assert_eq!(ceiling(Site::Olx), Some(100));
        assert_eq!(ceiling(Site::VivaReal), Some(50));
        assert_eq!(ceiling(Site::Zap), Some(500));
    }

    #[test]
    fn parses_partial_toml() {
        let toml = r#"
            [crawler]
            max_concurrent = 2

            [[sites]]
            site = "olx"
            max_pages = 3
            seeds = [{ url = "https://www.olx.com.br/imoveis/venda" }]

            [[sites]]
            site = "zap"
            enabled = false
            max_pages = 10
            seeds = [{ property_type = "condo", url = "https://www.zapimoveis.com.br/venda/" }]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.crawler.max_concurrent, 2);
        assert_eq!(config.crawler.timeout_secs, 30);
        assert_eq!(config.sites.len(), 2);
        assert!(config.sites[0].enabled);
        assert!(!config.sites[1].enabled);
        assert_eq!(config.sites[1].seeds[0].property_type, Some(PropertyType::Condo));
        assert_eq!(config.origins.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn origin_mapping_keeps_order() {
        let mapping = Config::default().origin_mapping();
        assert_eq!(mapping[0], ("chaves".to_string(), "Chaves na Mão".to_string()));
        assert_eq!(mapping[1].0, "zap");
    }
}
