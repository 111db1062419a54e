//! Request filter — decides which observed requests carry a descriptor.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CaptureError, CaptureResult};

/// Descriptor URLs on the Brightspace content service.
pub const DEFAULT_URL_PATTERN: &str =
    r"content\.us-east-1\.content-service\.brightspace\.com/.*?_config\.xml$";

/// Resource type of an observed request, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    XmlHttpRequest,
    Fetch,
    Document,
    Script,
    Other(String),
}

impl FromStr for RequestKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "xmlhttprequest" | "xhr" => RequestKind::XmlHttpRequest,
            "fetch" => RequestKind::Fetch,
            "main_frame" | "sub_frame" | "document" => RequestKind::Document,
            "script" => RequestKind::Script,
            other => RequestKind::Other(other.to_string()),
        })
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::XmlHttpRequest => f.write_str("xmlhttprequest"),
            RequestKind::Fetch => f.write_str("fetch"),
            RequestKind::Document => f.write_str("document"),
            RequestKind::Script => f.write_str("script"),
            RequestKind::Other(s) => f.write_str(s),
        }
    }
}

/// A request observed in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEvent {
    pub url: String,
    pub kind: RequestKind,
}

impl RequestEvent {
    pub fn new(url: impl Into<String>, kind: RequestKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    /// Parse a `<kind> <url>` line, or a bare URL (treated as an XHR).
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let first = parts.next()?;
        match parts.next() {
            Some(url) => Some(Self::new(url, first.parse().ok()?)),
            None => Some(Self::new(first, RequestKind::XmlHttpRequest)),
        }
    }
}

/// Matches XHR requests for descriptor XML.
#[derive(Debug, Clone)]
pub struct RequestFilter {
    pattern: Regex,
}

impl RequestFilter {
    /// Create a filter from a URL regex.
    pub fn new(pattern: &str) -> CaptureResult<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| CaptureError::Config(format!("invalid url pattern: {e}")))?;
        Ok(Self { pattern })
    }

    /// True if the request should be captured.
    pub fn matches(&self, event: &RequestEvent) -> bool {
        event.kind == RequestKind::XmlHttpRequest && self.pattern.is_match(&event.url)
    }
}

impl Default for RequestFilter {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_URL_PATTERN).expect("default pattern is valid"),
        }
    }
}
