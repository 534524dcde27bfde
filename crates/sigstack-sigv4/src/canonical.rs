//! Canonical request construction for AWS Signature Version 4.
//!
//! This module implements the canonical request format:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Every component is order sensitive. A difference of a single byte (header
//! case, a collapsed space, `+` versus `%20`) produces a signature the
//! service rejects.

use std::collections::BTreeMap;
use std::fmt;

use http::{HeaderMap, HeaderValue};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::SigningFailure;
use crate::request::SignableRequest;
use crate::rules::is_ignored_header;

/// The set of characters that must be percent-encoded in query components.
///
/// All characters except unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) are encoded.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Query escaping leaves spaces alone so they can be written as `+`.
const QUERY_ENCODE_SET: &AsciiSet = &URI_ENCODE_SET.remove(b' ');

/// Path escaping keeps segment separators.
const PATH_ENCODE_SET: &AsciiSet = &URI_ENCODE_SET.remove(b'/');

/// Query parameters keyed by decoded name, in sorted key order.
pub type QueryMap = BTreeMap<String, Vec<String>>;

/// The canonical request and the pieces it was assembled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// HTTP method.
    pub method: String,
    /// Canonical URI.
    pub uri: String,
    /// Canonical query string.
    pub query: String,
    /// Canonical header lines, without the trailing blank line.
    pub headers: String,
    /// `;`-joined sorted signed header names.
    pub signed_headers: String,
    /// Hex SHA-256 of the body, or `UNSIGNED-PAYLOAD`.
    pub payload_hash: String,
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\n{}\n\n{}\n{}",
            self.method, self.uri, self.query, self.headers, self.signed_headers, self.payload_hash
        )
    }
}

/// Canonical headers produced from a request's header map.
#[derive(Debug, Clone)]
pub struct CanonicalHeaders {
    /// The headers that were signed, `host` included.
    pub signed: HeaderMap,
    /// `;`-joined sorted lower-case names.
    pub signed_headers: String,
    /// `name:value` lines joined by `\n`.
    pub canonical: String,
}

/// Parse a raw query string into a [`QueryMap`].
///
/// `+` decodes to a space and percent escapes are decoded, so a query that
/// was already canonicalized parses back to the same map.
#[must_use]
pub fn parse_query(raw: &str) -> QueryMap {
    let mut query = QueryMap::new();
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        query
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    query
}

/// Escape a query key or value, writing spaces as `+`.
#[must_use]
pub fn query_escape(input: &str) -> String {
    utf8_percent_encode(input, QUERY_ENCODE_SET)
        .to_string()
        .replace(' ', "+")
}

/// Encode a query map as `k=v` pairs in key order.
///
/// Values keep the order they have in the map; sort them first for a
/// canonical result.
#[must_use]
pub fn encode_query(query: &QueryMap) -> String {
    let mut out = String::new();
    for (key, values) in query {
        let key = query_escape(key);
        for value in values {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(&key);
            out.push('=');
            out.push_str(&query_escape(value));
        }
    }
    out
}

/// Build the canonical query string.
///
/// Every `+` of the encoded string is rewritten to `%20`. Literal plus signs
/// were already encoded as `%2B`, so only encoded spaces are affected.
///
/// # Examples
///
/// ```
/// use sigstack_sigv4::canonical::{build_canonical_query_string, parse_query};
///
/// let query = parse_query("b=2&a=hello+world&a=abc");
/// assert_eq!(build_canonical_query_string(&query), "a=hello%20world&a=abc&b=2");
/// ```
#[must_use]
pub fn build_canonical_query_string(query: &QueryMap) -> String {
    encode_query(query).replace('+', "%20")
}

/// Sort each key's values so the encoded query is canonical.
pub fn sort_query_values(query: &mut QueryMap) {
    for values in query.values_mut() {
        values.sort_unstable();
    }
}

/// Percent-encode a path, keeping `/` separators.
///
/// `%` is itself encoded, so an already-escaped path is escaped a second
/// time, which is what most services expect.
///
/// # Examples
///
/// ```
/// use sigstack_sigv4::canonical::escape_path;
///
/// assert_eq!(escape_path("/foo*bar/a b"), "/foo%2Abar/a%20b");
/// assert_eq!(escape_path("/a%20b"), "/a%2520b");
/// ```
#[must_use]
pub fn escape_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_ENCODE_SET).to_string()
}

/// The request path that goes into the canonical URI, before escaping.
///
/// A [`crate::request::RawPath`] extension wins over the URI path; empty
/// paths become `/`.
#[must_use]
pub fn request_path(request: &dyn SignableRequest) -> String {
    let path = match request.raw_path() {
        Some(raw) => raw.path(),
        None => request.uri().path(),
    };
    if path.is_empty() {
        "/".to_owned()
    } else {
        path.to_owned()
    }
}

/// Build the canonical URI, applying the second escaping pass unless the
/// service disables it.
#[must_use]
pub fn build_canonical_uri(request: &dyn SignableRequest, disable_escaping: bool) -> String {
    let path = request_path(request);
    if disable_escaping {
        path
    } else {
        escape_path(&path)
    }
}

/// Build the canonical headers from a resolved host and the headers that
/// remain to be signed.
///
/// A `host` entry is always present and takes the resolved value; a `host`
/// header in `headers` is skipped. Ignored headers are dropped. Values are
/// trimmed of spaces and inner runs of spaces collapse to one; other
/// whitespace such as tabs is kept as sent. Repeated names
/// are joined with commas in the order they appear.
pub fn build_canonical_headers(
    host: &str,
    headers: &HeaderMap,
) -> Result<CanonicalHeaders, SigningFailure> {
    let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut signed = HeaderMap::new();

    let host_value =
        HeaderValue::from_str(host).map_err(|source| SigningFailure::InvalidHeaderValue {
            name: "host".to_owned(),
            source,
        })?;
    signed.insert(http::header::HOST, host_value);
    values.insert("host".to_owned(), vec![host.to_owned()]);

    for (name, value) in headers {
        if *name == http::header::HOST || is_ignored_header(name.as_str()) {
            continue;
        }
        signed.append(name.clone(), value.clone());
        values
            .entry(name.as_str().to_owned())
            .or_default()
            .push(strip_excess_spaces(&String::from_utf8_lossy(
                value.as_bytes(),
            )));
    }

    let signed_headers = values.keys().map(String::as_str).collect::<Vec<_>>().join(";");
    let canonical = values
        .iter()
        .map(|(name, vals)| format!("{name}:{}", vals.join(",")))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(CanonicalHeaders {
        signed,
        signed_headers,
        canonical,
    })
}

/// Trim ASCII spaces and collapse inner runs of them to a single space.
fn strip_excess_spaces(s: &str) -> String {
    let s = s.trim_matches(' ');
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch == ' ' {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
