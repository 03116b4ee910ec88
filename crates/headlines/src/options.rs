// ABOUTME: Configuration options for the headline pipeline and the PipelineBuilder fluent API.
// ABOUTME: Covers the fetch deadline, body limits, sniffing budget, HTTP client and strategy selection.

use std::time::Duration;

use crate::encoding::DEFAULT_SNIFF_LEN;
use crate::error::{FetchError, PipelineError};
use crate::extractors::loader::default_preset;
use crate::extractors::{SitePreset, Strategy, StrategyKind};
use crate::pipeline::Pipeline;
use crate::resource::{FetchOptions, Fetcher, DEFAULT_TIMEOUT, MAX_CONTENT_LENGTH};

/// Configuration options for a pipeline.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    /// User-Agent header; `None` sends the HTTP client's default.
    pub user_agent: Option<String>,
    pub max_body_bytes: usize,
    pub sniff_len: usize,
    pub http_client: Option<reqwest::Client>,
    pub strategy_kind: StrategyKind,
    /// Queries to compile the strategy from; the built-in default site when `None`.
    pub preset: Option<SitePreset>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            max_body_bytes: MAX_CONTENT_LENGTH,
            sniff_len: DEFAULT_SNIFF_LEN,
            http_client: None,
            strategy_kind: StrategyKind::default(),
            preset: None,
        }
    }
}

impl Options {
    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: self.timeout,
            max_body_bytes: self.max_body_bytes,
            sniff_len: self.sniff_len,
        }
    }
}

/// Builder for constructing Pipeline instances with custom configuration.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    opts: Options,
    strategy: Option<Strategy>,
}

impl PipelineBuilder {
    /// Create a new PipelineBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
            strategy: None,
        }
    }

    /// Set the deadline for a whole fetch.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = Some(user_agent.into());
        self
    }

    /// Set the largest body accepted, in bytes.
    pub fn max_body_bytes(mut self, max: usize) -> Self {
        self.opts.max_body_bytes = max;
        self
    }

    /// Set how many leading bytes encoding detection inspects.
    pub fn sniff_len(mut self, len: usize) -> Self {
        self.opts.sniff_len = len;
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Choose which strategy variant to compile from the preset.
    pub fn strategy_kind(mut self, kind: StrategyKind) -> Self {
        self.opts.strategy_kind = kind;
        self
    }

    /// Compile the strategy from a custom preset.
    pub fn preset(mut self, preset: SitePreset) -> Self {
        self.opts.preset = Some(preset);
        self
    }

    /// Use an already compiled strategy, ignoring `strategy_kind` and `preset`.
    pub fn strategy(mut self, strategy: impl Into<Strategy>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    /// Build the Pipeline with the configured options.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let strategy = match self.strategy {
            Some(strategy) => strategy,
            None => {
                let preset = self.opts.preset.clone().unwrap_or_else(default_preset);
                Strategy::from_preset(self.opts.strategy_kind, &preset)?
            }
        };

        let client = match self.opts.http_client.clone() {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder()
                    .timeout(self.opts.timeout)
                    .gzip(true)
                    .brotli(true)
                    .deflate(true);
                if let Some(ref ua) = self.opts.user_agent {
                    builder = builder.user_agent(ua);
                }
                builder
                    .build()
                    .map_err(|e| FetchError::client_config("BuildClient", anyhow::Error::new(e)))?
            }
        };

        let fetcher = Fetcher::new(client, self.opts.fetch_options());
        Ok(Pipeline::new(fetcher, strategy))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{Extractor, PatternMatch};

    #[test]
    fn defaults() {
        let opts = Options::default();
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert_eq!(opts.sniff_len, 1024);
        assert_eq!(opts.max_body_bytes, MAX_CONTENT_LENGTH);
        assert!(opts.user_agent.is_none());
        assert_eq!(opts.strategy_kind, StrategyKind::SelectorQuery);
    }

    #[test]
    fn builder_applies_fetch_options() {
        let pipeline = PipelineBuilder::new()
            .timeout(Duration::from_secs(5))
            .sniff_len(64)
            .max_body_bytes(1000)
            .user_agent("headlines-test")
            .build()
            .unwrap();
        let fetch = pipeline.fetcher().options();
        assert_eq!(fetch.timeout, Duration::from_secs(5));
        assert_eq!(fetch.sniff_len, 64);
        assert_eq!(fetch.max_body_bytes, 1000);
    }

    #[test]
    fn builder_compiles_requested_kind() {
        for kind in StrategyKind::ALL {
            let pipeline = PipelineBuilder::new().strategy_kind(kind).build().unwrap();
            assert_eq!(pipeline.strategy().kind(), kind);
        }
    }

    #[test]
    fn explicit_strategy_wins() {
        let pipeline = PipelineBuilder::new()
            .strategy_kind(StrategyKind::TreeQuery)
            .strategy(PatternMatch::new(r"(\w+)").unwrap())
            .build()
            .unwrap();
        assert_eq!(pipeline.strategy().kind(), StrategyKind::PatternMatch);
    }

    #[test]
    fn bad_preset_query_fails_build_as_parse_error() {
        let mut preset = default_preset();
        preset.xpath = "not a path".to_string();
        let err = PipelineBuilder::new()
            .strategy_kind(StrategyKind::TreeQuery)
            .preset(preset)
            .build()
            .unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn client_build_failure_is_client_config_error() {
        let err = PipelineBuilder::new()
            .user_agent("bad\nagent")
            .build()
            .unwrap_err();
        assert!(err.is_fetch());
        let fetch = err.as_fetch().unwrap();
        assert!(fetch.is_client_config());
        assert!(!fetch.is_network());
        assert_eq!(fetch.op, "BuildClient");
    }
}
