// ABOUTME: Resource handling module for fetching a single web page.
// ABOUTME: Handles HTTP GET with a hard deadline, status and size checks, and streaming charset decoding.

use std::time::Duration;

use tracing::{debug, warn};

use crate::document::DecodedDocument;
use crate::encoding::{detect, Detection, Hints, StreamDecoder, DEFAULT_SNIFF_LEN};
use crate::error::FetchError;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Default deadline for a whole fetch, body included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for fetching a resource.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub max_body_bytes: usize,
    pub sniff_len: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_body_bytes: MAX_CONTENT_LENGTH,
            sniff_len: DEFAULT_SNIFF_LEN,
        }
    }
}

/// Fetches one URL and decodes its body to UTF-8.
///
/// Every call is independent: one request, no retries, no caching. The
/// response is owned by `fetch` and dropped on every return path, which
/// releases the connection.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    opts: FetchOptions,
}

impl Fetcher {
    pub fn new(client: reqwest::Client, opts: FetchOptions) -> Self {
        Self { client, opts }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.opts
    }

    /// Fetch `url` and return its decoded text.
    ///
    /// The whole operation, including reading the body, is bounded by
    /// `FetchOptions::timeout`.
    pub async fn fetch(&self, url: &str) -> Result<DecodedDocument, FetchError> {
        match tokio::time::timeout(self.opts.timeout, self.fetch_inner(url)).await {
            Ok(result) => result,
            Err(elapsed) => Err(FetchError::timeout(
                url,
                "Fetch",
                Some(anyhow::anyhow!("deadline of {:?} exceeded: {}", self.opts.timeout, elapsed)),
            )),
        }
    }

    async fn fetch_inner(&self, url: &str) -> Result<DecodedDocument, FetchError> {
        let parsed_url = validate_url(url)?;

        debug!(url, "fetching");
        let mut response = self
            .client
            .get(parsed_url)
            .send()
            .await
            .map_err(|e| FetchError::from_transport(url, "Fetch", e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(url, status = status.as_u16(), "rejecting non-success status");
            return Err(FetchError::http_status(url, "Fetch", status.as_u16()));
        }

        // Check Content-Length header before reading body
        if let Some(len) = response.content_length() {
            if len > self.opts.max_body_bytes as u64 {
                return Err(FetchError::too_large(url, "Fetch", self.opts.max_body_bytes));
            }
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Buffer just enough of the body to sniff its encoding.
        let sniff_len = self.opts.sniff_len;
        let mut prefix: Vec<u8> = Vec::with_capacity(sniff_len);
        let mut at_eof = false;
        let mut read_error = None;
        while prefix.len() < sniff_len {
            match response.chunk().await {
                Ok(Some(chunk)) => prefix.extend_from_slice(&chunk),
                Ok(None) => {
                    at_eof = true;
                    break;
                }
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            }
        }
        self.check_size(url, prefix.len())?;

        let hints = Hints {
            at_eof,
            ..Hints::for_url(Some(&final_url), content_type.as_deref())
        };
        let detection = prefix_detection(
            url,
            &prefix[..prefix.len().min(sniff_len)],
            &hints,
            read_error.as_ref(),
        );
        debug!(
            url,
            encoding = detection.encoding.name(),
            source = ?detection.source,
            "detected encoding"
        );

        if let Some(e) = read_error {
            return Err(FetchError::from_transport(url, "ReadBody", e));
        }

        let mut decoder = StreamDecoder::new(detection.encoding);
        decoder.push(&prefix);
        let mut total = prefix.len();
        drop(prefix);

        if !at_eof {
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| FetchError::from_transport(url, "ReadBody", e))?
            {
                total += chunk.len();
                self.check_size(url, total)?;
                decoder.push(&chunk);
            }
        }

        let (text, had_errors) = decoder.finish();
        if had_errors {
            warn!(url, encoding = detection.encoding.name(), "body contained malformed sequences");
        }
        debug!(url, bytes = total, chars = text.len(), "decoded body");

        Ok(DecodedDocument::new(text, detection).with_url(final_url.as_str()))
    }

    fn check_size(&self, url: &str, len: usize) -> Result<(), FetchError> {
        if len > self.opts.max_body_bytes {
            return Err(FetchError::too_large(url, "Fetch", self.opts.max_body_bytes));
        }
        Ok(())
    }
}

/// Detect the encoding of a body prefix. A prefix cut short by a read
/// error decodes with the default encoding.
fn prefix_detection(
    url: &str,
    prefix: &[u8],
    hints: &Hints<'_>,
    read_error: Option<&reqwest::Error>,
) -> Detection {
    match read_error {
        Some(e) => {
            warn!(url, error = %e, "could not read body prefix, using default encoding");
            Detection::fallback()
        }
        None => detect(prefix, hints),
    }
}

/// Parse `url` and require an http or https scheme.
fn validate_url(url: &str) -> Result<url::Url, FetchError> {
    if url.is_empty() {
        return Err(FetchError::invalid_url(url, "Fetch", None));
    }

    let parsed_url = url::Url::parse(url).map_err(|e| {
        FetchError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    let scheme = parsed_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(FetchError::invalid_url(
            url,
            "Fetch",
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }
    Ok(parsed_url)
}
