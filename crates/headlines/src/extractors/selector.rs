// ABOUTME: SelectorQuery strategy: builds a dom_query document and evaluates a CSS selector against it.
// ABOUTME: The selector is compiled once at construction and reused for every parse.

use std::fmt;

use dom_query::{Document, Matcher};

use crate::document::DecodedDocument;
use crate::error::ParseError;
use crate::extractors::{Extractor, StrategyKind};

/// CSS selector query over a `dom_query` tree.
///
/// Matched elements without the attribute are skipped.
#[derive(Clone)]
pub struct SelectorQuery {
    css: String,
    matcher: Matcher,
    attr: String,
}

impl SelectorQuery {
    pub fn new(css: &str, attr: &str) -> Result<Self, ParseError> {
        let matcher = Matcher::new(css).map_err(|e| {
            ParseError::invalid_query(
                StrategyKind::SelectorQuery,
                "compile selector",
                anyhow::anyhow!("invalid selector {:?}: {:?}", css, e),
            )
        })?;
        Ok(Self {
            css: css.to_string(),
            matcher,
            attr: attr.to_ascii_lowercase(),
        })
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }
}

impl fmt::Debug for SelectorQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorQuery")
            .field("css", &self.css)
            .field("attr", &self.attr)
            .finish()
    }
}

impl Extractor for SelectorQuery {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SelectorQuery
    }

    fn parse(&self, doc: &DecodedDocument) -> Result<Vec<String>, ParseError> {
        let document = Document::from(doc.text());
        let found = document
            .select_matcher(&self.matcher)
            .iter()
            .filter_map(|el| el.attr(&self.attr).map(|v| String::from(&*v)))
            .collect();
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn container_query() -> SelectorQuery {
        SelectorQuery::new("div.container a[target=_blank] img", "alt").unwrap()
    }

    #[test]
    fn extracts_alt_from_fixture() {
        let doc = DecodedDocument::from(
            r#"<div class="container"><a target="_blank"><img alt="Headline A"/></a></div>"#,
        );
        assert_eq!(container_query().parse(&doc).unwrap(), vec!["Headline A"]);
    }

    #[test]
    fn results_follow_document_order() {
        let doc = DecodedDocument::from(
            r#"<div class="container">
                 <a target="_blank"><img alt="One"></a>
                 <a target="_self"><img alt="Skipped"></a>
                 <a target="_blank"><img alt="Two"><img alt="Two"></a>
               </div>"#,
        );
        assert_eq!(container_query().parse(&doc).unwrap(), vec!["One", "Two", "Two"]);
    }

    #[test]
    fn no_match_is_empty() {
        let doc = DecodedDocument::from("<div class=\"other\"><img alt=\"x\"></div>");
        assert!(container_query().parse(&doc).unwrap().is_empty());
    }

    #[test]
    fn invalid_selector_is_parse_error() {
        let err = SelectorQuery::new("[[[invalid", "alt").unwrap_err();
        assert_eq!(err.strategy, StrategyKind::SelectorQuery);
    }
}
