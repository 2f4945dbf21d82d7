//! Upstream target resolution.
//!
//! Turns the inbound query string into the absolute URL the request is
//! forwarded to:
//!
//! ```text
//! /proxy?proxy=https://mirror.example&path=golang.org/x/mod/@v/list&v=1
//!     → https://mirror.example/golang.org/x/mod/@v/list?v=1
//! ```
//!
//! The base URL contributes scheme, host and port only. Its path and query are
//! replaced by the `path` parameter and the pass-through parameters.
//!
//! The decoded `path` is re-encoded byte for byte, so `%`, `\` and other
//! delimiters reach the upstream escaped instead of being reinterpreted by URL
//! parsing. Dot segments are refused rather than resolved.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::{form_urlencoded, Url};

use crate::http::error::ProxyError;

/// Query parameter naming the upstream base URL.
pub const PROXY_PARAM: &str = "proxy";

/// Query parameter naming the upstream path.
pub const PATH_PARAM: &str = "path";

/// Bytes escaped when the decoded `path` is written into the target URL.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Where an inbound `/proxy` request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    url: Url,
}

impl TargetDescriptor {
    /// Resolve the target from a raw query string.
    ///
    /// `default_base` is used when `proxy` is absent or empty. The first
    /// occurrence of `path` and `proxy` wins; every other parameter is passed
    /// through in key order, repeated keys keeping their relative order.
    pub fn from_query(query: Option<&str>, default_base: &str) -> Result<Self, ProxyError> {
        let pairs: Vec<(String, String)> = form_urlencoded::parse(query.unwrap_or("").as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let path = first_value(&pairs, PATH_PARAM)
            .filter(|p| !p.is_empty())
            .ok_or(ProxyError::MissingPath)?;
        let path = normalize_path(path);
        if has_dot_segment(&path) {
            return Err(ProxyError::InvalidPath(
                "dot segments are not allowed".to_string(),
            ));
        }

        let base = first_value(&pairs, PROXY_PARAM)
            .filter(|p| !p.is_empty())
            .unwrap_or(default_base);

        let mut url = Url::parse(base).map_err(|e| ProxyError::InvalidProxyUrl(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(ProxyError::InvalidProxyUrl(format!(
                "{base:?} cannot carry a path"
            )));
        }

        url.set_path(&utf8_percent_encode(&path, PATH_ENCODE_SET).to_string());
        url.set_query(None);
        url.set_fragment(None);

        let mut passthrough: Vec<&(String, String)> = pairs
            .iter()
            .filter(|(k, _)| k != PROXY_PARAM && k != PATH_PARAM)
            .collect();
        passthrough.sort_by(|a, b| a.0.cmp(&b.0));

        if !passthrough.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(passthrough.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        Ok(Self { url })
    }

    /// The fully constructed upstream URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the response may be cached by the caller.
    ///
    /// Version listings and `@latest` lookups change over time; anything else
    /// served by a module proxy is immutable. The check is a plain substring
    /// test over the whole URL, query string included.
    pub fn is_cacheable(&self) -> bool {
        let url = self.url.as_str();
        !url.contains("latest") && !url.contains("list")
    }
}

fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn has_dot_segment(path: &str) -> bool {
    path.split('/').any(|segment| segment == "." || segment == "..")
}

/// Prefix `path` with `/` unless it already starts with one.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
