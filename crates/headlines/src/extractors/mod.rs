// ABOUTME: Headline extraction strategies: regex pattern match, node-path tree query, CSS selector query.
// ABOUTME: Strategy is the tagged variant the pipeline is built with; Extractor is the shared capability.

//! Headline extraction module.
//!
//! Every strategy turns a [`DecodedDocument`] into the ordered list of
//! strings it finds, in document order, duplicates kept. Finding nothing is
//! an empty list, not an error.
//!
//! Submodules:
//! - `pattern`: regex scan over the flat text.
//! - `xpath`: node-path query compiler and evaluator over a `scraper` tree.
//! - `tree`: node-path query strategy.
//! - `selector`: CSS selector strategy over a `dom_query` tree.
//! - `presets` / `loader`: per-site queries shipped with the crate.

use std::fmt;
use std::str::FromStr;

use crate::document::DecodedDocument;
use crate::error::ParseError;

pub mod loader;
pub mod pattern;
pub mod presets;
pub mod selector;
pub mod tree;
pub mod xpath;

pub use pattern::PatternMatch;
pub use presets::{PresetRegistry, SitePreset};
pub use selector::SelectorQuery;
pub use tree::TreeQuery;

/// Names the extraction strategy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StrategyKind {
    PatternMatch,
    TreeQuery,
    #[default]
    SelectorQuery,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::PatternMatch,
        StrategyKind::TreeQuery,
        StrategyKind::SelectorQuery,
    ];
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyKind::PatternMatch => "pattern",
            StrategyKind::TreeQuery => "xpath",
            StrategyKind::SelectorQuery => "css",
        };
        write!(f, "{}", s)
    }
}

/// Returned when a strategy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy {0:?}, expected one of: pattern, xpath, css")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pattern" | "re" | "regex" => Ok(StrategyKind::PatternMatch),
            "xpath" | "tree" => Ok(StrategyKind::TreeQuery),
            "css" | "selector" => Ok(StrategyKind::SelectorQuery),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// Capability shared by all strategies.
pub trait Extractor {
    fn kind(&self) -> StrategyKind;

    /// Extract headline strings from `doc` in document order.
    fn parse(&self, doc: &DecodedDocument) -> Result<Vec<String>, ParseError>;
}

/// A compiled extraction strategy, chosen once when a pipeline is built.
#[derive(Debug, Clone)]
pub enum Strategy {
    PatternMatch(PatternMatch),
    TreeQuery(TreeQuery),
    SelectorQuery(SelectorQuery),
}

impl Strategy {
    /// Compile the `kind` variant from the queries in `preset`.
    pub fn from_preset(kind: StrategyKind, preset: &SitePreset) -> Result<Self, ParseError> {
        let strategy = match kind {
            StrategyKind::PatternMatch => PatternMatch::new(&preset.pattern)?.into(),
            StrategyKind::TreeQuery => TreeQuery::new(&preset.xpath, &preset.attr)?.into(),
            StrategyKind::SelectorQuery => SelectorQuery::new(&preset.css, &preset.attr)?.into(),
        };
        Ok(strategy)
    }

    /// Compile the `kind` variant for the built-in default site.
    pub fn builtin(kind: StrategyKind) -> Result<Self, ParseError> {
        Self::from_preset(kind, &loader::default_preset())
    }
}

impl Extractor for Strategy {
    fn kind(&self) -> StrategyKind {
        match self {
            Strategy::PatternMatch(s) => s.kind(),
            Strategy::TreeQuery(s) => s.kind(),
            Strategy::SelectorQuery(s) => s.kind(),
        }
    }

    fn parse(&self, doc: &DecodedDocument) -> Result<Vec<String>, ParseError> {
        match self {
            Strategy::PatternMatch(s) => s.parse(doc),
            Strategy::TreeQuery(s) => s.parse(doc),
            Strategy::SelectorQuery(s) => s.parse(doc),
        }
    }
}

impl From<PatternMatch> for Strategy {
    fn from(s: PatternMatch) -> Self {
        Strategy::PatternMatch(s)
    }
}

impl From<TreeQuery> for Strategy {
    fn from(s: TreeQuery) -> Self {
        Strategy::TreeQuery(s)
    }
}

impl From<SelectorQuery> for Strategy {
    fn from(s: SelectorQuery) -> Self {
        Strategy::SelectorQuery(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strategy_kind_parses_names_and_aliases() {
        assert_eq!("pattern".parse(), Ok(StrategyKind::PatternMatch));
        assert_eq!("Regex".parse(), Ok(StrategyKind::PatternMatch));
        assert_eq!("xpath".parse(), Ok(StrategyKind::TreeQuery));
        assert_eq!("tree".parse(), Ok(StrategyKind::TreeQuery));
        assert_eq!("CSS".parse(), Ok(StrategyKind::SelectorQuery));
        assert_eq!(
            "soup".parse::<StrategyKind>(),
            Err(UnknownStrategy("soup".to_string()))
        );
    }

    #[test]
    fn strategy_kind_display_parses_back() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
    }

    #[test]
    fn builtin_strategies_compile() {
        for kind in StrategyKind::ALL {
            let strategy = Strategy::builtin(kind).expect("builtin preset compiles");
            assert_eq!(strategy.kind(), kind);
        }
    }

    #[test]
    fn builtin_strategies_agree_on_empty_page() {
        let doc = DecodedDocument::from("<html><body><p>nothing here</p></body></html>");
        for kind in StrategyKind::ALL {
            let strategy = Strategy::builtin(kind).unwrap();
            assert_eq!(strategy.parse(&doc).unwrap(), Vec::<String>::new());
        }
    }
}
