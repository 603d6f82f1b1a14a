//! Origin resolution from record-set filenames.

use crate::models::Config;

/// Label returned when no keyword matches a filename.
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// Maps filenames to origin labels by ordered keyword lookup.
#[derive(Debug, Clone, Default)]
pub struct OriginResolver {
    /// (lowercase keyword, label), scanned front to back
    mapping: Vec<(String, String)>,
}

impl OriginResolver {
    /// Create a resolver; keywords are lowercased, order is preserved.
    pub fn new<K, L>(mapping: impl IntoIterator<Item = (K, L)>) -> Self
    where
        K: Into<String>,
        L: Into<String>,
    {
        Self {
            mapping: mapping
                .into_iter()
                .map(|(k, l)| (k.into().to_lowercase(), l.into()))
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.origin_mapping())
    }

    /// Origin for the first keyword contained in `filename`, or
    /// [`UNKNOWN_ORIGIN`].
    pub fn resolve(&self, filename: &str) -> &str {
        let lower = filename.to_lowercase();
        self.mapping
            .iter()
            .find(|(keyword, _)| !keyword.is_empty() && lower.contains(keyword.as_str()))
            .map(|(_, label)| label.as_str())
            .unwrap_or(UNKNOWN_ORIGIN)
    }
}
