// ABOUTME: DecodedDocument, the UTF-8 text of a fetched page handed to extraction strategies.
// ABOUTME: Records the detected encoding and the URL it was fetched from when known.

use crate::encoding::Detection;

/// Decoded page text. Always valid UTF-8; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDocument {
    text: String,
    detection: Option<Detection>,
    url: Option<String>,
}

impl DecodedDocument {
    pub(crate) fn new(text: String, detection: Detection) -> Self {
        Self {
            text,
            detection: Some(detection),
            url: None,
        }
    }

    pub(crate) fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Encoding detection that produced this text, `None` for text supplied directly.
    pub fn detection(&self) -> Option<Detection> {
        self.detection
    }

    /// Final URL after redirects, when the document was fetched.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl From<String> for DecodedDocument {
    fn from(text: String) -> Self {
        Self {
            text,
            detection: None,
            url: None,
        }
    }
}

impl From<&str> for DecodedDocument {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}
