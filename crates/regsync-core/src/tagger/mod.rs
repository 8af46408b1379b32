use regex::Regex;

use regsync_model::Application;

/// Tag marking registry entries owned by this engine.
pub const DEFAULT_SENTINEL_TAG: &str = "mesos";
/// Label key carrying routing prefixes (case-insensitive, optional `_<n>` suffix).
pub const DEFAULT_PREFIX_LABEL: &str = "urlprefix";
/// Prefix prepended to each routing value to form a tag.
pub const DEFAULT_TAG_PREFIX: &str = "urlprefix-";

/// Separator between several routing values inside one label.
const VALUE_SEPARATOR: char = ';';

/// Tagging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggerConfig {
    pub sentinel: String,
    pub prefix_label: String,
    pub tag_prefix: String,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL_TAG.to_string(),
            prefix_label: DEFAULT_PREFIX_LABEL.to_string(),
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
        }
    }
}

/// Derives the registry tag set of an application.
///
/// The sentinel tag always comes first; it scopes reconciliation to entries this engine owns.
/// Every label whose key matches `<prefix_label>` or `<prefix_label>_<n>` (any case)
/// contributes one tag per `;`-separated, whitespace-trimmed value.
#[derive(Debug, Clone)]
pub struct ServiceTagger {
    sentinel: String,
    tag_prefix: String,
    label: Regex,
}

impl ServiceTagger {
    pub fn new(cfg: TaggerConfig) -> Result<Self, regex::Error> {
        let pattern = format!(r"(?i)^{}(_\d+)?$", regex::escape(&cfg.prefix_label));
        Ok(Self {
            sentinel: cfg.sentinel,
            tag_prefix: cfg.tag_prefix,
            label: Regex::new(&pattern)?,
        })
    }

    #[inline]
    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Returns `true` if `key` declares routing prefixes.
    #[inline]
    pub fn is_prefix_label(&self, key: &str) -> bool {
        self.label.is_match(key)
    }

    /// Ordered, duplicate-free tag list for `app`.
    pub fn tag(&self, app: &Application) -> Vec<String> {
        let mut tags = vec![self.sentinel.clone()];

        let values = app
            .labels
            .iter()
            .filter(|(key, _)| self.is_prefix_label(key))
            .flat_map(|(_, value)| value.split(VALUE_SEPARATOR))
            .map(str::trim)
            .filter(|piece| !piece.is_empty());

        for piece in values {
            let tag = format!("{}{}", self.tag_prefix, piece);
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }
}

impl Default for ServiceTagger {
    fn default() -> Self {
        Self::new(TaggerConfig::default()).expect("default prefix label pattern must be valid")
    }
}
