// ABOUTME: Error types for the headline pipeline: FetchError, ParseError and the stage-tagged PipelineError.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

use crate::extractors::StrategyKind;

/// Error codes representing the ways a fetch can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorCode {
    InvalidUrl,
    Network,
    Timeout,
    HttpStatus,
    TooLarge,
    /// The HTTP client could not be built. No request was made.
    ClientConfig,
}

impl fmt::Display for FetchErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchErrorCode::InvalidUrl => "invalid URL",
            FetchErrorCode::Network => "network error",
            FetchErrorCode::Timeout => "timeout",
            FetchErrorCode::HttpStatus => "HTTP status error",
            FetchErrorCode::TooLarge => "content too large",
            FetchErrorCode::ClientConfig => "client configuration error",
        };
        write!(f, "{}", s)
    }
}

/// Error returned by the fetch stage.
#[derive(Debug, thiserror::Error)]
pub struct FetchError {
    pub code: FetchErrorCode,
    pub url: String,
    pub op: String,
    /// Response status, set for `HttpStatus` errors.
    pub status: Option<u16>,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(status) = self.status {
            write!(f, " {}", status)?;
        }
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl FetchError {
    fn new(
        code: FetchErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            status: None,
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(FetchErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a Network error.
    pub fn network(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(FetchErrorCode::Network, url, op, source)
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(FetchErrorCode::Timeout, url, op, source)
    }

    /// Create an HttpStatus error carrying the response status.
    pub fn http_status(url: impl Into<String>, op: impl Into<String>, status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::new(FetchErrorCode::HttpStatus, url, op, None)
        }
    }

    /// Create a TooLarge error.
    pub fn too_large(url: impl Into<String>, op: impl Into<String>, limit: usize) -> Self {
        Self::new(
            FetchErrorCode::TooLarge,
            url,
            op,
            Some(anyhow::anyhow!("body exceeds {} bytes", limit)),
        )
    }

    /// Create a ClientConfig error. It is not tied to any URL.
    pub fn client_config(op: impl Into<String>, source: anyhow::Error) -> Self {
        Self::new(FetchErrorCode::ClientConfig, "", op, Some(source))
    }

    /// Classify a transport error from reqwest.
    pub(crate) fn from_transport(
        url: impl Into<String>,
        op: impl Into<String>,
        err: reqwest::Error,
    ) -> Self {
        if err.is_timeout() {
            Self::timeout(url, op, Some(anyhow::Error::new(err)))
        } else {
            Self::network(url, op, Some(anyhow::Error::new(err)))
        }
    }

    /// Returns true for transport failures, including timeouts.
    pub fn is_network(&self) -> bool {
        matches!(
            self.code,
            FetchErrorCode::Network | FetchErrorCode::Timeout
        )
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == FetchErrorCode::Timeout
    }

    /// Returns true if this is an HttpStatus error.
    pub fn is_http_status(&self) -> bool {
        self.code == FetchErrorCode::HttpStatus
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == FetchErrorCode::InvalidUrl
    }

    /// Returns true if this is a TooLarge error.
    pub fn is_too_large(&self) -> bool {
        self.code == FetchErrorCode::TooLarge
    }

    /// Returns true if this is a ClientConfig error.
    pub fn is_client_config(&self) -> bool {
        self.code == FetchErrorCode::ClientConfig
    }
}

/// Error returned by an extraction strategy.
#[derive(Debug, thiserror::Error)]
pub struct ParseError {
    pub strategy: StrategyKind,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse: {} ({})", self.op, self.strategy)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ParseError {
    /// Create an error for a query expression that does not compile.
    pub fn invalid_query(
        strategy: StrategyKind,
        op: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Self {
            strategy,
            op: op.into(),
            source: Some(source),
        }
    }
}

/// Pipeline stage an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Parse,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Parse => write!(f, "parse"),
        }
    }
}

/// Error returned by `Pipeline::run`, tagged with the failing stage.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Fetch(_) => Stage::Fetch,
            PipelineError::Parse(_) => Stage::Parse,
        }
    }

    pub fn is_fetch(&self) -> bool {
        self.stage() == Stage::Fetch
    }

    pub fn is_parse(&self) -> bool {
        self.stage() == Stage::Parse
    }

    /// The underlying fetch error, if the fetch stage failed.
    pub fn as_fetch(&self) -> Option<&FetchError> {
        match self {
            PipelineError::Fetch(e) => Some(e),
            PipelineError::Parse(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display_includes_status() {
        let err = FetchError::http_status("https://example.com", "Fetch", 404);
        assert!(err.is_http_status());
        assert!(!err.is_network());
        assert_eq!(err.status, Some(404));
        assert_eq!(
            err.to_string(),
            "fetch: Fetch https://example.com: HTTP status error 404"
        );
    }

    #[test]
    fn timeout_counts_as_network() {
        let err = FetchError::timeout("https://example.com", "Fetch", None);
        assert!(err.is_timeout());
        assert!(err.is_network());
    }

    #[test]
    fn client_config_is_not_a_network_error() {
        let err = FetchError::client_config("BuildClient", anyhow::anyhow!("no TLS backend"));
        assert!(err.is_client_config());
        assert!(!err.is_network());
        assert!(err.url.is_empty());
        assert_eq!(
            err.to_string(),
            "fetch: BuildClient : client configuration error: no TLS backend"
        );
    }

    #[test]
    fn pipeline_error_keeps_stage() {
        let fetch: PipelineError = FetchError::network("u", "Fetch", None).into();
        assert_eq!(fetch.stage(), Stage::Fetch);
        assert!(fetch.is_fetch());
        assert!(fetch.as_fetch().is_some());

        let parse: PipelineError = ParseError::invalid_query(
            StrategyKind::TreeQuery,
            "compile",
            anyhow::anyhow!("bad path"),
        )
        .into();
        assert_eq!(parse.stage(), Stage::Parse);
        assert!(parse.is_parse());
        assert!(parse.as_fetch().is_none());
        assert_eq!(parse.to_string(), "parse: compile (xpath): bad path");
    }
}
