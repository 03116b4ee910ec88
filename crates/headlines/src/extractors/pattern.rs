// ABOUTME: PatternMatch strategy: repeated non-overlapping regex search over the raw decoded text.
// ABOUTME: Captures the first group of each match, unescaping JSON string escapes when present.

use regex::Regex;

use crate::document::DecodedDocument;
use crate::error::ParseError;
use crate::extractors::{Extractor, StrategyKind};

/// Regex-based extraction. Treats the document as flat text.
///
/// Each match contributes its first capture group, or the whole match when
/// the pattern has no groups.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    re: Regex,
}

impl PatternMatch {
    pub fn new(pattern: &str) -> Result<Self, ParseError> {
        let re = Regex::new(pattern).map_err(|e| {
            ParseError::invalid_query(
                StrategyKind::PatternMatch,
                "compile pattern",
                anyhow::Error::new(e),
            )
        })?;
        Ok(Self { re })
    }

    pub fn as_str(&self) -> &str {
        self.re.as_str()
    }
}

impl Extractor for PatternMatch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PatternMatch
    }

    fn parse(&self, doc: &DecodedDocument) -> Result<Vec<String>, ParseError> {
        let group = if self.re.captures_len() > 1 { 1 } else { 0 };
        let found = self
            .re
            .captures_iter(doc.text())
            .filter_map(|caps| caps.get(group))
            .map(|m| unescape_json(m.as_str()))
            .collect();
        Ok(found)
    }
}

/// Decode JSON string escapes (`\"`, `\u4e2d`, ...) in a captured fragment.
///
/// Fragments that are not valid JSON string bodies are returned unchanged.
fn unescape_json(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    serde_json::from_str::<String>(&format!("\"{}\"", raw)).unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::loader::default_preset;
    use pretty_assertions::assert_eq;

    fn builtin() -> PatternMatch {
        PatternMatch::new(&default_preset().pattern).unwrap()
    }

    #[test]
    fn captures_names_in_order() {
        let doc = DecodedDocument::from(
            r#"<script>var data=[{"contId":1,"name":"Story One","pic":"a.jpg"},{"contId":2,"name":"Story Two","pic":"b.jpg"}]</script>"#,
        );
        assert_eq!(
            builtin().parse(&doc).unwrap(),
            vec!["Story One".to_string(), "Story Two".to_string()]
        );
    }

    #[test]
    fn skips_fields_between_cont_id_and_name() {
        let doc = DecodedDocument::from(
            r#"{"contId":"17","nodeId":25,"forwardType":2,"name":"Long Form","x":1}"#,
        );
        assert_eq!(builtin().parse(&doc).unwrap(), vec!["Long Form".to_string()]);
    }

    #[test]
    fn keeps_duplicates() {
        let doc = DecodedDocument::from(
            r#"{"contId":1,"name":"Same",} {"contId":1,"name":"Same",}"#,
        );
        assert_eq!(builtin().parse(&doc).unwrap(), vec!["Same", "Same"]);
    }

    #[test]
    fn unescapes_json_strings() {
        let doc = DecodedDocument::from(
            r#"{"contId":3,"name":"头条 \"quoted\" ok","x":0}"#,
        );
        assert_eq!(
            builtin().parse(&doc).unwrap(),
            vec!["头条 \"quoted\" ok".to_string()]
        );
    }

    #[test]
    fn no_match_is_empty() {
        let doc = DecodedDocument::from("<html><body>plain page</body></html>");
        assert!(builtin().parse(&doc).unwrap().is_empty());
    }

    #[test]
    fn pattern_without_group_returns_whole_match() {
        let p = PatternMatch::new(r"\d+").unwrap();
        let doc = DecodedDocument::from("a1 b22 c333");
        assert_eq!(p.parse(&doc).unwrap(), vec!["1", "22", "333"]);
    }

    #[test]
    fn invalid_pattern_is_parse_error() {
        let err = PatternMatch::new("([unclosed").unwrap_err();
        assert_eq!(err.strategy, StrategyKind::PatternMatch);
    }

    #[test]
    fn parse_is_repeatable() {
        let p = builtin();
        let doc = DecodedDocument::from(r#"{"contId":1,"name":"A",}"#);
        assert_eq!(p.parse(&doc).unwrap(), p.parse(&doc).unwrap());
    }

    #[test]
    fn test_unescape_json_leaves_invalid_escapes() {
        assert_eq!(unescape_json(r"bad \q escape"), r"bad \q escape");
        assert_eq!(unescape_json("plain"), "plain");
    }
}
