//! Header classification rules.
//!
//! Names are compared in lower case, which is how `http::HeaderName` stores
//! them.

/// Headers that are never part of the signature.
///
/// Proxies and SDK layers rewrite these after signing.
const IGNORED_HEADERS: &[&str] = &["authorization", "user-agent", "x-amzn-trace-id"];

/// Headers that must stay signed headers when presigning.
const REQUIRED_SIGNED_HEADERS: &[&str] = &[
    "cache-control",
    "content-disposition",
    "content-encoding",
    "content-language",
    "content-md5",
    "content-type",
    "expires",
    "if-match",
    "if-modified-since",
    "if-none-match",
    "if-unmodified-since",
    "range",
    "x-amz-acl",
    "x-amz-content-sha256",
    "x-amz-copy-source",
    "x-amz-copy-source-if-match",
    "x-amz-copy-source-if-modified-since",
    "x-amz-copy-source-if-none-match",
    "x-amz-copy-source-if-unmodified-since",
    "x-amz-copy-source-range",
    "x-amz-copy-source-server-side-encryption-customer-algorithm",
    "x-amz-copy-source-server-side-encryption-customer-key",
    "x-amz-copy-source-server-side-encryption-customer-key-md5",
    "x-amz-grant-full-control",
    "x-amz-grant-read",
    "x-amz-grant-read-acp",
    "x-amz-grant-write",
    "x-amz-grant-write-acp",
    "x-amz-metadata-directive",
    "x-amz-mfa",
    "x-amz-request-payer",
    "x-amz-server-side-encryption",
    "x-amz-server-side-encryption-aws-kms-key-id",
    "x-amz-server-side-encryption-customer-algorithm",
    "x-amz-server-side-encryption-customer-key",
    "x-amz-server-side-encryption-customer-key-md5",
    "x-amz-storage-class",
    "x-amz-tagging",
    "x-amz-website-redirect-location",
];

const REQUIRED_SIGNED_PREFIX: &str = "x-amz-meta-";
const HOISTABLE_PREFIX: &str = "x-amz-";

/// Whether the header is left out of the canonical headers.
#[must_use]
pub fn is_ignored_header(name: &str) -> bool {
    IGNORED_HEADERS
        .iter()
        .any(|ignored| ignored.eq_ignore_ascii_case(name))
}

/// Whether the header has to travel as a signed header, even when presigning.
#[must_use]
pub fn is_required_signed_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.starts_with(REQUIRED_SIGNED_PREFIX) || REQUIRED_SIGNED_HEADERS.contains(&name.as_str())
}

/// Whether a presigned request may move this header into its query string.
#[must_use]
pub fn is_hoistable_header(name: &str) -> bool {
    name.to_ascii_lowercase().starts_with(HOISTABLE_PREFIX) && !is_required_signed_header(name)
}

/// Render a header name in MIME canonical form (`x-amz-target` becomes
/// `X-Amz-Target`), the form hoisted headers take as query keys.
#[must_use]
pub fn canonical_mime_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for ch in name.chars() {
        if upper {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch.to_ascii_lowercase());
        }
        upper = ch == '-';
    }
    out
}
