// ABOUTME: Character encoding detection over a bounded body prefix and incremental decoding to UTF-8.
// ABOUTME: Detection order is BOM, Content-Type charset, <meta> prescan, then statistical sniffing.

//! Encoding detection and decoding.
//!
//! Detection only ever looks at a bounded prefix of the body (see
//! [`DEFAULT_SNIFF_LEN`]). It never fails: when nothing can be determined the
//! result is [`DEFAULT_ENCODING`] with [`DetectionSource::Default`].

use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8, UTF_8_INIT};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::document::DecodedDocument;

/// Number of leading body bytes inspected by the detector.
pub const DEFAULT_SNIFF_LEN: usize = 1024;

/// Encoding used when detection has nothing to go on.
pub static DEFAULT_ENCODING: &Encoding = &UTF_8_INIT;

/// Comments are skipped by the meta prescan. An unterminated one runs to the end of the prefix.
static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s-u)<!--.*?(?:-->|\z)").expect("comment pattern is valid"));

/// A `<meta ...>` tag; the attribute list is group 1.
static META_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i-u)<meta[\s/]([^>]*)").expect("meta tag pattern is valid"));

/// One attribute with an optional quoted or bare value.
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?-u)([^\s"'/=>]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("attribute pattern is valid")
});

/// Where a detected encoding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    Bom,
    Header,
    Meta,
    Sniffed,
    Default,
}

/// Result of running the detector on a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub encoding: &'static Encoding,
    pub source: DetectionSource,
}

impl Detection {
    /// The default detection used when the prefix is empty or unreadable.
    pub fn fallback() -> Self {
        Self {
            encoding: DEFAULT_ENCODING,
            source: DetectionSource::Default,
        }
    }

    fn new(encoding: &'static Encoding, source: DetectionSource) -> Self {
        Self { encoding, source }
    }
}

/// Out-of-band hints available to the detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hints<'a> {
    /// Value of the `Content-Type` response header.
    pub content_type: Option<&'a str>,
    /// Top-level domain of the source URL, used to bias statistical sniffing.
    pub tld: Option<&'a str>,
    /// True when the prefix is the whole body.
    pub at_eof: bool,
}

impl<'a> Hints<'a> {
    /// Build hints from a response URL and content type.
    pub fn for_url(url: Option<&'a url::Url>, content_type: Option<&'a str>) -> Self {
        Self {
            content_type,
            tld: url.and_then(tld_of),
            at_eof: false,
        }
    }
}

fn tld_of(url: &url::Url) -> Option<&str> {
    let host = url.host_str()?;
    let tld = host.rsplit('.').next()?;
    if tld.is_empty() || !tld.bytes().all(|b| b.is_ascii_lowercase()) {
        return None;
    }
    Some(tld)
}

/// Determine the most likely encoding of a body from its leading bytes.
pub fn detect(prefix: &[u8], hints: &Hints<'_>) -> Detection {
    if prefix.is_empty() {
        return Detection::fallback();
    }

    if let Some((encoding, _)) = Encoding::for_bom(prefix) {
        return Detection::new(encoding, DetectionSource::Bom);
    }

    if let Some(encoding) = hints
        .content_type
        .and_then(extract_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return Detection::new(encoding, DetectionSource::Header);
    }

    if let Some(encoding) = prescan_meta(prefix) {
        return Detection::new(encoding, DetectionSource::Meta);
    }

    if is_utf8_prefix(prefix, hints.at_eof) {
        return Detection::new(UTF_8, DetectionSource::Sniffed);
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(prefix, hints.at_eof);
    let encoding = detector.guess(hints.tld.map(str::as_bytes), true);
    Detection::new(encoding, DetectionSource::Sniffed)
}

/// Extract charset value from Content-Type header.
pub(crate) fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

/// Find a charset declared by a `<meta>` tag inside the prefix.
///
/// Accepts `<meta charset=...>` and `<meta http-equiv="content-type"
/// content="...; charset=...">`. Tags inside comments are ignored, as are
/// labels `encoding_rs` does not know. A meta tag readable as ASCII rules out
/// UTF-16, so UTF-16 labels map to UTF-8.
fn prescan_meta(prefix: &[u8]) -> Option<&'static Encoding> {
    let visible = COMMENT_RE.replace_all(prefix, &b""[..]);
    META_TAG_RE
        .captures_iter(&visible)
        .filter_map(|caps| caps.get(1))
        .find_map(|attrs| meta_charset(attrs.as_bytes()))
        .map(Encoding::output_encoding)
}

fn meta_charset(attrs: &[u8]) -> Option<&'static Encoding> {
    let mut http_equiv = None;
    let mut content = None;
    for caps in ATTR_RE.captures_iter(attrs) {
        let Some(name) = caps.get(1) else { continue };
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or(&b""[..], |m| m.as_bytes());
        let name = name.as_bytes();
        if name.eq_ignore_ascii_case(b"charset") {
            return Encoding::for_label(value);
        } else if name.eq_ignore_ascii_case(b"http-equiv") {
            http_equiv = http_equiv.or(Some(value));
        } else if name.eq_ignore_ascii_case(b"content") {
            content = content.or(Some(value));
        }
    }
    if !http_equiv?.eq_ignore_ascii_case(b"content-type") {
        return None;
    }
    let label = extract_charset(&String::from_utf8_lossy(content?))?;
    Encoding::for_label(label.as_bytes())
}

/// Valid UTF-8, allowing a truncated final sequence when more bytes follow.
fn is_utf8_prefix(prefix: &[u8], at_eof: bool) -> bool {
    match std::str::from_utf8(prefix) {
        Ok(_) => true,
        Err(e) => !at_eof && e.error_len().is_none(),
    }
}

/// Incremental decoder turning body chunks into UTF-8 text.
///
/// A leading BOM is stripped. Malformed sequences become U+FFFD.
pub struct StreamDecoder {
    decoder: Decoder,
    out: String,
    had_errors: bool,
}

impl StreamDecoder {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder_with_bom_removal(),
            out: String::new(),
            had_errors: false,
        }
    }

    /// Decode one chunk of the body.
    pub fn push(&mut self, chunk: &[u8]) {
        self.decode(chunk, false);
    }

    /// Flush the decoder and return the decoded text and whether any
    /// replacement characters were introduced.
    pub fn finish(mut self) -> (String, bool) {
        self.decode(&[], true);
        (self.out, self.had_errors)
    }

    fn decode(&mut self, mut input: &[u8], last: bool) {
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(input.len().saturating_mul(3));
            self.out.reserve(needed);
            let (result, read, had_errors) =
                self.decoder.decode_to_string(input, &mut self.out, last);
            self.had_errors |= had_errors;
            input = &input[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
    }
}

/// Decode an in-memory body with the same detection rules the fetcher uses.
///
/// The detector sees at most `sniff_len` leading bytes.
pub fn decode(body: &[u8], hints: &Hints<'_>, sniff_len: usize) -> DecodedDocument {
    let prefix_len = body.len().min(sniff_len);
    let hints = Hints {
        at_eof: prefix_len == body.len(),
        ..*hints
    };
    let detection = detect(&body[..prefix_len], &hints);

    let mut decoder = StreamDecoder::new(detection.encoding);
    decoder.push(body);
    let (text, _) = decoder.finish();
    DecodedDocument::new(text, detection)
}
