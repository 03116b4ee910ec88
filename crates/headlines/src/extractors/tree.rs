// ABOUTME: TreeQuery strategy: builds a scraper HTML tree and evaluates a node-path query against it.
// ABOUTME: Reads one attribute off every matched element, in document order.

use scraper::Html;

use crate::document::DecodedDocument;
use crate::error::ParseError;
use crate::extractors::xpath::NodePath;
use crate::extractors::{Extractor, StrategyKind};

/// Node-path query over an html5ever tree built by `scraper`.
///
/// Tree construction follows the HTML5 error-recovery rules, so truncated or
/// unbalanced markup produces a best-effort tree rather than an error.
/// Matched elements without the attribute are skipped.
#[derive(Debug, Clone)]
pub struct TreeQuery {
    path: NodePath,
    attr: String,
}

impl TreeQuery {
    pub fn new(expr: &str, attr: &str) -> Result<Self, ParseError> {
        let path = NodePath::compile(expr).map_err(|e| {
            ParseError::invalid_query(
                StrategyKind::TreeQuery,
                "compile node path",
                anyhow::Error::new(e),
            )
        })?;
        Ok(Self {
            path,
            attr: attr.to_ascii_lowercase(),
        })
    }

    pub fn expr(&self) -> &str {
        self.path.as_str()
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }
}

impl Extractor for TreeQuery {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TreeQuery
    }

    fn parse(&self, doc: &DecodedDocument) -> Result<Vec<String>, ParseError> {
        let html = Html::parse_document(doc.text());
        let found = self
            .path
            .select(&html)
            .into_iter()
            .filter_map(|el| el.value().attr(&self.attr).map(str::to_string))
            .collect();
        Ok(found)
    }
}
