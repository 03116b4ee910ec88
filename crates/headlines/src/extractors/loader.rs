// ABOUTME: Loader for the site presets embedded in the crate as JSON.
// ABOUTME: Provides load_builtin_presets() and default_preset() for the default target site.

use crate::extractors::presets::{PresetRegistry, SitePreset};

/// Embedded JSON containing the built-in site presets.
const BUILTIN_PRESETS_JSON: &str = include_str!("../../data/presets.json");

/// Domain of the site fetched when no URL is given.
pub const DEFAULT_DOMAIN: &str = "www.thepaper.cn";

/// Loads the builtin preset registry from embedded JSON.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed or cannot be deserialized.
pub fn load_builtin_presets() -> PresetRegistry {
    let presets: Vec<SitePreset> =
        serde_json::from_str(BUILTIN_PRESETS_JSON).expect("failed to parse builtin presets");

    let mut registry = PresetRegistry::new();
    for preset in presets {
        registry.register(preset);
    }
    registry
}

/// Returns the preset for [`DEFAULT_DOMAIN`].
///
/// # Panics
///
/// Panics if the embedded presets do not include the default domain.
pub fn default_preset() -> SitePreset {
    load_builtin_presets()
        .get(DEFAULT_DOMAIN)
        .cloned()
        .expect("builtin presets include the default domain")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_builtin_presets_succeeds() {
        let registry = load_builtin_presets();
        assert!(!registry.is_empty());
    }

    #[test]
    fn default_preset_targets_thepaper() {
        let preset = default_preset();
        assert_eq!(preset.domain, DEFAULT_DOMAIN);
        assert_eq!(preset.url, "https://www.thepaper.cn");
        assert_eq!(preset.attr, "alt");
        assert_eq!(
            preset.xpath,
            r#"//div[@class="index_carousel_img__HbOWM"]/a[@target="_blank"]/img"#
        );
        assert_eq!(preset.css, "div.index_carousel_img__HbOWM a[target=_blank] img");
    }

    #[test]
    fn bare_domain_maps_to_default() {
        let registry = load_builtin_presets();
        assert_eq!(registry.get("thepaper.cn"), Some(&default_preset()));
    }
}
