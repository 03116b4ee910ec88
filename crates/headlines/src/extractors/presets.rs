// ABOUTME: Per-site query presets and a registry for looking them up by domain.
// ABOUTME: A preset carries the pattern, node path and CSS selector for one site, plus the attribute to read.

//! Site presets.
//!
//! The queries that locate headlines depend entirely on one site's markup,
//! so they are data rather than code. Each preset holds one query per
//! strategy; [`crate::extractors::Strategy::from_preset`] compiles one of them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_attr() -> String {
    "alt".to_string()
}

/// Headline queries for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePreset {
    /// Primary domain this preset applies to
    pub domain: String,
    /// Additional domains this preset supports
    #[serde(default)]
    pub supported_domains: Vec<String>,
    /// Page to fetch when no URL is given
    pub url: String,
    /// Regex for PatternMatch; group 1 is the headline
    pub pattern: String,
    /// Node path for TreeQuery
    pub xpath: String,
    /// CSS selector for SelectorQuery
    pub css: String,
    /// Attribute read off elements matched by `xpath` / `css`
    #[serde(default = "default_attr")]
    pub attr: String,
}

/// Registry for looking up presets by domain.
#[derive(Debug, Default, Clone)]
pub struct PresetRegistry {
    map: HashMap<String, SitePreset>,
}

impl PresetRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a preset for its primary and supported domains.
    pub fn register(&mut self, preset: SitePreset) {
        for dom in &preset.supported_domains {
            self.map.insert(dom.clone(), preset.clone());
        }
        self.map.insert(preset.domain.clone(), preset);
    }

    /// Looks up a preset by domain.
    pub fn get(&self, domain: &str) -> Option<&SitePreset> {
        self.map.get(domain)
    }

    /// Looks up the preset for the host of `url`.
    pub fn for_url(&self, url: &str) -> Option<&SitePreset> {
        let parsed = url::Url::parse(url).ok()?;
        self.get(parsed.host_str()?)
    }

    /// Returns the number of registered domain mappings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no presets are registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
