// ABOUTME: Pipeline composition root: fetches one page, decodes it, and runs the chosen extraction strategy.
// ABOUTME: Errors come back as PipelineError tagged with the stage that failed.

use tracing::debug;

use crate::document::DecodedDocument;
use crate::encoding::{decode, Hints};
use crate::error::PipelineError;
use crate::extractors::{Extractor, Strategy};
use crate::options::PipelineBuilder;
use crate::resource::Fetcher;

/// Ordered headlines, in document order, duplicates kept.
pub type Headlines = Vec<String>;

/// A fetcher and one extraction strategy, both fixed at construction.
///
/// Holds no per-run state, so `run` may be called any number of times,
/// concurrently if needed.
#[derive(Debug, Clone)]
pub struct Pipeline {
    fetcher: Fetcher,
    strategy: Strategy,
}

impl Pipeline {
    pub fn new(fetcher: Fetcher, strategy: Strategy) -> Self {
        Self { fetcher, strategy }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Fetch `url` and extract its headlines.
    pub async fn run(&self, url: &str) -> Result<Headlines, PipelineError> {
        let doc = self.fetcher.fetch(url).await?;
        self.extract_text(&doc)
    }

    /// Run only the extraction stage on an already decoded document.
    pub fn extract_text(&self, doc: &DecodedDocument) -> Result<Headlines, PipelineError> {
        let found = self.strategy.parse(doc)?;
        debug!(
            strategy = %self.strategy.kind(),
            url = doc.url().unwrap_or(""),
            count = found.len(),
            "extracted headlines"
        );
        Ok(found)
    }

    /// Decode an in-memory body the way `run` decodes a response, then extract.
    pub fn extract_bytes(
        &self,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<Headlines, PipelineError> {
        let hints = Hints {
            content_type,
            ..Default::default()
        };
        let doc = decode(body, &hints, self.fetcher.options().sniff_len);
        self.extract_text(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::extractors::{SelectorQuery, StrategyKind, TreeQuery};
    use encoding_rs::GBK;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;

    const CAROUSEL: &str = r#"<html><head><meta charset="gbk"></head><body>
        <div class="index_carousel_img__HbOWM">
          <a target="_blank" href="/1"><img alt="上海发布头条"></a>
          <a target="_blank" href="/2"><img alt="第二条新闻"></a>
        </div></body></html>"#;

    fn pipeline(kind: StrategyKind) -> Pipeline {
        Pipeline::builder().strategy_kind(kind).build().unwrap()
    }

    #[tokio::test]
    async fn run_fetches_decodes_and_extracts() {
        let (body, _, _) = GBK.encode(CAROUSEL);
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200)
                .header("content-type", "text/html")
                .body(body.to_vec());
        });

        for kind in [StrategyKind::TreeQuery, StrategyKind::SelectorQuery] {
            let headlines = pipeline(kind).run(&server.url("/")).await.unwrap();
            assert_eq!(headlines, vec!["上海发布头条", "第二条新闻"]);
        }
        mock.assert_hits(2);
    }

    #[tokio::test]
    async fn run_reports_fetch_stage_on_404() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body(CAROUSEL);
        });

        let err = pipeline(StrategyKind::SelectorQuery)
            .run(&server.url("/missing"))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Fetch);
        assert!(err.as_fetch().is_some_and(|e| e.is_http_status()));
    }

    #[test]
    fn extract_bytes_uses_content_type_hint() {
        let (body, _, _) = GBK.encode("<div class=\"c\"><a target=\"_blank\"><img alt=\"新闻\"></a></div>");
        let p = Pipeline::builder()
            .strategy(SelectorQuery::new("div.c a[target=_blank] img", "alt").unwrap())
            .build()
            .unwrap();
        assert_eq!(
            p.extract_bytes(&body, Some("text/html; charset=gbk")).unwrap(),
            vec!["新闻"]
        );
    }

    #[test]
    fn extract_text_is_repeatable() {
        let p = Pipeline::builder()
            .strategy(TreeQuery::new("//img", "alt").unwrap())
            .build()
            .unwrap();
        let doc = DecodedDocument::from("<img alt=a><img alt=b><img alt=a>");
        let first = p.extract_text(&doc).unwrap();
        assert_eq!(first, vec!["a", "b", "a"]);
        assert_eq!(p.extract_text(&doc).unwrap(), first);
    }
}
