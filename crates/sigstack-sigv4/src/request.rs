//! The request view the signer works on.
//!
//! Both signing modes work on a [`RequestSnapshot`]. Header signing writes
//! the snapshot's headers and URI back to the caller's request once
//! signing has succeeded; presigning only ever reads the request. The body
//! is never touched in either mode.

use http::{HeaderMap, Method, Uri};

/// Literal, already-escaped request path used instead of the URI's path.
///
/// Attach it as a request extension when a service needs escaping the
/// `http::Uri` type cannot represent. The opaque form `//host/path` is
/// accepted and its `//host` prefix is dropped.
///
/// # Examples
///
/// ```
/// use sigstack_sigv4::request::RawPath;
///
/// assert_eq!(RawPath::new("//example.org/bucket/key").path(), "/bucket/key");
/// assert_eq!(RawPath::new("/a%2Fb").path(), "/a%2Fb");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPath(String);

impl RawPath {
    /// Wrap a raw path or opaque `//host/path` string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The string as supplied.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the opaque `//host/path` form.
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.0.starts_with("//")
    }

    /// The path component, `/` when empty.
    #[must_use]
    pub fn path(&self) -> &str {
        let path = match self.0.strip_prefix("//") {
            Some(rest) => rest.find('/').map_or("", |idx| &rest[idx..]),
            None => self.0.as_str(),
        };
        if path.is_empty() { "/" } else { path }
    }
}

/// An HTTP request that can be signed.
pub trait SignableRequest {
    /// Request method.
    fn method(&self) -> &Method;
    /// Request URI.
    fn uri(&self) -> &Uri;
    /// Replace the request URI.
    fn set_uri(&mut self, uri: Uri);
    /// Request headers.
    fn headers(&self) -> &HeaderMap;
    /// Mutable request headers.
    fn headers_mut(&mut self) -> &mut HeaderMap;
    /// Raw path override, if any.
    fn raw_path(&self) -> Option<&RawPath>;
}

impl<B> SignableRequest for http::Request<B> {
    fn method(&self) -> &Method {
        http::Request::method(self)
    }

    fn uri(&self) -> &Uri {
        http::Request::uri(self)
    }

    fn set_uri(&mut self, uri: Uri) {
        *self.uri_mut() = uri;
    }

    fn headers(&self) -> &HeaderMap {
        http::Request::headers(self)
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        http::Request::headers_mut(self)
    }

    fn raw_path(&self) -> Option<&RawPath> {
        self.extensions().get::<RawPath>()
    }
}

impl SignableRequest for http::request::Parts {
    fn method(&self) -> &Method {
        &self.method
    }

    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn set_uri(&mut self, uri: Uri) {
        self.uri = uri;
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn raw_path(&self) -> Option<&RawPath> {
        self.extensions.get::<RawPath>()
    }
}

/// A private, body-less copy of a request.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    raw_path: Option<RawPath>,
}

impl RequestSnapshot {
    /// Copy method, URI, headers and raw path out of `request`.
    #[must_use]
    pub fn of(request: &dyn SignableRequest) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
            raw_path: request.raw_path().cloned(),
        }
    }

    /// Take the headers, dropping the rest of the snapshot.
    #[must_use]
    pub fn into_headers(self) -> HeaderMap {
        self.headers
    }
}

impl SignableRequest for RequestSnapshot {
    fn method(&self) -> &Method {
        &self.method
    }

    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn set_uri(&mut self, uri: Uri) {
        self.uri = uri;
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn raw_path(&self) -> Option<&RawPath> {
        self.raw_path.as_ref()
    }
}
