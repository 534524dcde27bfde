//! The SigV4 signer core.
//!
//! Both entry points run the same synchronous pipeline:
//!
//! 1. inject the date (and session token) into headers or query,
//! 2. sort each query key's values and sanitize the host,
//! 3. hoist `X-Amz-*` headers into the query (presign only),
//! 4. build the canonical headers, query and URI,
//! 5. derive the signing key and sign the string to sign.
//!
//! Both modes run on a [`RequestSnapshot`]. Header mode copies the signed
//! headers, `Authorization` included, and the rewritten URI back onto the
//! caller's request only when signing succeeds, so a failure leaves the
//! request as it was. Presign mode hands back a URL and never writes to the
//! caller's request.

use std::sync::Arc;
use std::time::Duration;

use http::header::{AUTHORIZATION, HOST, HeaderName};
use http::uri::PathAndQuery;
use http::{HeaderMap, HeaderValue, Uri};
use sigstack_core::SigningConfig;
use tracing::debug;

use crate::canonical::{
    CanonicalHeaders, CanonicalRequest, QueryMap, build_canonical_headers,
    build_canonical_query_string, build_canonical_uri, parse_query, sort_query_values,
};
use crate::credentials::{Credentials, CredentialsProvider, retrieve_unexpired};
use crate::error::{SignerError, SigningFailure};
use crate::key::{
    SIGNING_ALGORITHM, build_string_to_sign, compute_signature, derive_scoped_signing_key,
};
use crate::request::{RequestSnapshot, SignableRequest};
use crate::rules::{canonical_mime_name, is_hoistable_header};
use crate::scope::CredentialScope;
use crate::time::SigningTime;

/// Header carrying the signing timestamp in header mode.
pub const AMZ_DATE_HEADER: &str = "x-amz-date";
/// Header carrying the session token in header mode.
pub const AMZ_SECURITY_TOKEN_HEADER: &str = "x-amz-security-token";

const AMZ_ALGORITHM_KEY: &str = "X-Amz-Algorithm";
const AMZ_CREDENTIAL_KEY: &str = "X-Amz-Credential";
const AMZ_DATE_KEY: &str = "X-Amz-Date";
const AMZ_EXPIRES_KEY: &str = "X-Amz-Expires";
const AMZ_SECURITY_TOKEN_KEY: &str = "X-Amz-Security-Token";
const AMZ_SIGNED_HEADERS_KEY: &str = "X-Amz-SignedHeaders";
const AMZ_SIGNATURE_KEY: &str = "X-Amz-Signature";

/// Behavior switches of the signer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignerOptions {
    /// Keep `X-Amz-*` headers out of presigned query strings.
    pub disable_header_hoisting: bool,
    /// Use the request path as-is in the canonical URI.
    pub disable_uri_path_escaping: bool,
    /// Log the canonical request and string to sign at debug level.
    pub log_signing: bool,
}

impl From<&SigningConfig> for SignerOptions {
    /// S3-family services always sign the path unescaped.
    fn from(config: &SigningConfig) -> Self {
        Self {
            disable_header_hoisting: config.disable_header_hoisting,
            disable_uri_path_escaping: config.disable_uri_path_escaping
                || config.service.is_s3_family(),
            log_signing: config.log_signing,
        }
    }
}

/// Per-call signing inputs.
#[derive(Debug, Clone, Copy)]
pub struct SigningParams<'a> {
    /// Hex SHA-256 of the body, or `UNSIGNED-PAYLOAD`.
    pub payload_hash: &'a str,
    /// Service signing name.
    pub service: &'a str,
    /// Signing region.
    pub region: &'a str,
    /// Instant the signature is valid from.
    pub signing_time: SigningTime,
}

impl<'a> SigningParams<'a> {
    /// Bundle the inputs of one signing call.
    #[must_use]
    pub fn new(
        payload_hash: &'a str,
        service: &'a str,
        region: &'a str,
        signing_time: SigningTime,
    ) -> Self {
        Self {
            payload_hash,
            service,
            region,
            signing_time,
        }
    }
}

/// Outcome of header-mode signing.
///
/// The request itself already carries the result; this keeps the
/// intermediate strings for diagnostics.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// The `Authorization` header value written to the request.
    pub authorization: String,
    /// Lower-case hex signature.
    pub signature: String,
    /// `;`-joined signed header names.
    pub signed_headers: String,
    /// The canonical request that was signed.
    pub canonical_request: CanonicalRequest,
    /// The string to sign.
    pub string_to_sign: String,
}

/// Outcome of presigning.
#[derive(Debug, Clone)]
pub struct PresignedRequest {
    /// The presigned URL.
    pub url: String,
    /// Headers covered by the signature. They must be sent with the URL.
    pub signed_headers: HeaderMap,
    /// Lower-case hex signature.
    pub signature: String,
    /// The canonical request that was signed.
    pub canonical_request: CanonicalRequest,
    /// The string to sign.
    pub string_to_sign: String,
}

/// Signs requests in place through the `Authorization` header.
pub trait HeaderSigner: Send + Sync + std::fmt::Debug {
    /// Sign `request` with `credentials`, mutating its headers and query.
    fn sign_header(
        &self,
        request: &mut dyn SignableRequest,
        credentials: &Credentials,
        params: &SigningParams<'_>,
    ) -> Result<SignedRequest, SignerError>;
}

/// Signs requests into a presigned URL, leaving the request untouched.
pub trait QuerySigner: Send + Sync + std::fmt::Debug {
    /// Presign `request` with `credentials`, valid for `expires`.
    fn sign_query(
        &self,
        request: &dyn SignableRequest,
        credentials: &Credentials,
        params: &SigningParams<'_>,
        expires: Duration,
    ) -> Result<PresignedRequest, SignerError>;
}

/// SigV4 signer backed by a credentials provider.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use chrono::{DateTime, Utc};
/// use sigstack_sigv4::credentials::{Credentials, StaticCredentialsProvider};
/// use sigstack_sigv4::signer::{HeaderSigner, Signer, SigningParams};
/// use sigstack_sigv4::time::SigningTime;
///
/// let credentials = Credentials::new("AKID", "SECRET");
/// let signer = Signer::new(Arc::new(StaticCredentialsProvider::new(credentials.clone())));
/// let mut request = http::Request::get("https://example.amazonaws.com/").body(()).unwrap();
/// let time = SigningTime::from(DateTime::<Utc>::UNIX_EPOCH);
///
/// signer
///     .sign_header(&mut request, &credentials, &SigningParams::new("UNSIGNED-PAYLOAD", "svc", "us-east-1", time))
///     .unwrap();
/// assert!(request.headers().contains_key("authorization"));
/// ```
#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Arc<dyn CredentialsProvider>,
    options: SignerOptions,
}

impl Signer {
    /// A signer with default options.
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialsProvider>) -> Self {
        Self {
            credentials,
            options: SignerOptions::default(),
        }
    }

    /// Replace the signer options.
    #[must_use]
    pub fn with_options(mut self, options: SignerOptions) -> Self {
        self.options = options;
        self
    }

    /// The signer options.
    #[must_use]
    pub fn options(&self) -> &SignerOptions {
        &self.options
    }

    /// The credentials provider consulted by [`Signer::sign_http`] and
    /// [`Signer::presign_http`].
    #[must_use]
    pub fn credentials_provider(&self) -> &Arc<dyn CredentialsProvider> {
        &self.credentials
    }

    /// Retrieve credentials, then sign `request` in place.
    ///
    /// A provider failure is returned before the request is touched.
    pub async fn sign_http<R: SignableRequest>(
        &self,
        request: &mut R,
        params: &SigningParams<'_>,
    ) -> Result<SignedRequest, SignerError> {
        let credentials =
            retrieve_unexpired(self.credentials.as_ref(), params.signing_time.as_datetime())
                .await?;
        self.sign_header(request, &credentials, params)
    }

    /// Retrieve credentials, then presign `request`.
    pub async fn presign_http<R: SignableRequest>(
        &self,
        request: &R,
        params: &SigningParams<'_>,
        expires: Duration,
    ) -> Result<PresignedRequest, SignerError> {
        let credentials =
            retrieve_unexpired(self.credentials.as_ref(), params.signing_time.as_datetime())
                .await?;
        self.sign_query(request, &credentials, params, expires)
    }

    fn log_signing(&self, canonical_request: &CanonicalRequest, string_to_sign: &str) {
        if self.options.log_signing {
            debug!(canonical_request = %canonical_request, "Built canonical request");
            debug!(string_to_sign, "Built string to sign");
        }
    }
}

impl HeaderSigner for Signer {
    fn sign_header(
        &self,
        request: &mut dyn SignableRequest,
        credentials: &Credentials,
        params: &SigningParams<'_>,
    ) -> Result<SignedRequest, SignerError> {
        // The request is only written once every step has succeeded.
        let mut snapshot = RequestSnapshot::of(&*request);
        let built = SigningPipeline {
            credentials,
            params,
            options: self.options,
            expires: None,
        }
        .build(&mut snapshot)?;

        let authorization = format!(
            "{SIGNING_ALGORITHM} Credential={}, SignedHeaders={}, Signature={}",
            built.credential, built.headers.signed_headers, built.signature
        );
        let authorization_value = header_value(&AUTHORIZATION, &authorization)?;
        let uri = with_raw_query(snapshot.uri(), &built.query)?;

        let mut headers = snapshot.into_headers();
        headers.insert(AUTHORIZATION, authorization_value);
        *request.headers_mut() = headers;
        request.set_uri(uri);

        self.log_signing(&built.canonical_request, &built.string_to_sign);
        debug!(
            access_key_id = %credentials.access_key_id,
            service = %params.service,
            region = %params.region,
            "Signed request"
        );

        Ok(SignedRequest {
            authorization,
            signature: built.signature,
            signed_headers: built.headers.signed_headers,
            canonical_request: built.canonical_request,
            string_to_sign: built.string_to_sign,
        })
    }
}

impl QuerySigner for Signer {
    fn sign_query(
        &self,
        request: &dyn SignableRequest,
        credentials: &Credentials,
        params: &SigningParams<'_>,
        expires: Duration,
    ) -> Result<PresignedRequest, SignerError> {
        let mut snapshot = RequestSnapshot::of(request);
        let built = SigningPipeline {
            credentials,
            params,
            options: self.options,
            expires: Some(expires),
        }
        .build(&mut snapshot)?;

        let query = format!("{}&{AMZ_SIGNATURE_KEY}={}", built.query, built.signature);
        let url = presigned_url(&snapshot, &query);

        self.log_signing(&built.canonical_request, &built.string_to_sign);
        if self.options.log_signing {
            debug!(url, "Built presigned url");
        }
        debug!(
            access_key_id = %credentials.access_key_id,
            service = %params.service,
            region = %params.region,
            expires_secs = expires.as_secs(),
            "Presigned request"
        );

        Ok(PresignedRequest {
            url,
            signed_headers: built.headers.signed,
            signature: built.signature,
            canonical_request: built.canonical_request,
            string_to_sign: built.string_to_sign,
        })
    }
}

/// Everything produced by one run of the pipeline.
struct Built {
    credential: String,
    headers: CanonicalHeaders,
    query: String,
    canonical_request: CanonicalRequest,
    string_to_sign: String,
    signature: String,
}

/// One signing run; `expires` is set for presigning.
struct SigningPipeline<'a> {
    credentials: &'a Credentials,
    params: &'a SigningParams<'a>,
    options: SignerOptions,
    expires: Option<Duration>,
}

impl SigningPipeline<'_> {
    fn build(&self, request: &mut dyn SignableRequest) -> Result<Built, SigningFailure> {
        if self.credentials.access_key_id.is_empty()
            || self.credentials.secret_access_key.is_empty()
        {
            return Err(SigningFailure::EmptyCredentials);
        }
        if self.params.payload_hash.is_empty() {
            return Err(SigningFailure::MissingPayloadHash);
        }

        let timestamp = self.params.signing_time.timestamp();
        let mut query = parse_query(request.uri().query().unwrap_or_default());
        self.set_required_fields(request.headers_mut(), &mut query, &timestamp)?;
        sort_query_values(&mut query);

        let host = sanitize_host(request)?;
        let scope = CredentialScope::new(
            &self.params.signing_time,
            self.params.region,
            self.params.service,
        );
        let credential = format!("{}/{scope}", self.credentials.access_key_id);

        let headers = if self.expires.is_some() {
            query.insert(AMZ_CREDENTIAL_KEY.to_owned(), vec![credential.clone()]);
            let unsigned = if self.options.disable_header_hoisting {
                request.headers().clone()
            } else {
                hoist_headers(request.headers(), &mut query)
            };
            let headers = build_canonical_headers(&host, &unsigned)?;
            query.insert(
                AMZ_SIGNED_HEADERS_KEY.to_owned(),
                vec![headers.signed_headers.clone()],
            );
            headers
        } else {
            build_canonical_headers(&host, request.headers())?
        };

        let raw_query = build_canonical_query_string(&query);
        let canonical_request = CanonicalRequest {
            method: request.method().as_str().to_owned(),
            uri: build_canonical_uri(&*request, self.options.disable_uri_path_escaping),
            query: raw_query.clone(),
            headers: headers.canonical.clone(),
            signed_headers: headers.signed_headers.clone(),
            payload_hash: self.params.payload_hash.to_owned(),
        };

        let string_to_sign =
            build_string_to_sign(&timestamp, &scope.to_string(), &canonical_request.to_string());
        let signing_key = derive_scoped_signing_key(&self.credentials.secret_access_key, &scope);
        let signature = compute_signature(&signing_key, &string_to_sign);

        Ok(Built {
            credential,
            headers,
            query: raw_query,
            canonical_request,
            string_to_sign,
            signature,
        })
    }

    fn set_required_fields(
        &self,
        headers: &mut HeaderMap,
        query: &mut QueryMap,
        timestamp: &str,
    ) -> Result<(), SigningFailure> {
        let token = self.credentials.session_token();

        if let Some(expires) = self.expires {
            query.insert(AMZ_ALGORITHM_KEY.to_owned(), vec![SIGNING_ALGORITHM.to_owned()]);
            if let Some(token) = token {
                query.insert(AMZ_SECURITY_TOKEN_KEY.to_owned(), vec![token.to_owned()]);
            }
            query.insert(AMZ_DATE_KEY.to_owned(), vec![timestamp.to_owned()]);
            query.insert(
                AMZ_EXPIRES_KEY.to_owned(),
                vec![expires.as_secs().to_string()],
            );
            return Ok(());
        }

        let date = HeaderName::from_static(AMZ_DATE_HEADER);
        headers.insert(date.clone(), header_value(&date, timestamp)?);
        if let Some(token) = token {
            let name = HeaderName::from_static(AMZ_SECURITY_TOKEN_HEADER);
            headers.insert(name.clone(), header_value(&name, token)?);
        }
        Ok(())
    }
}

/// Move hoistable headers into `query` and return the rest.
///
/// Hoisted names replace any query entry of the same MIME-canonical name.
fn hoist_headers(headers: &HeaderMap, query: &mut QueryMap) -> HeaderMap {
    let mut hoisted = QueryMap::new();
    let mut unsigned = HeaderMap::new();
    for (name, value) in headers {
        if is_hoistable_header(name.as_str()) {
            hoisted
                .entry(canonical_mime_name(name.as_str()))
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        } else {
            unsigned.append(name.clone(), value.clone());
        }
    }
    query.extend(hoisted);
    unsigned
}

/// Resolve the host to sign.
///
/// The `Host` header wins over the URI authority. A port that is the
/// scheme's default is stripped and the result written back to the `Host`
/// header so the signed and sent values agree.
fn sanitize_host(request: &mut dyn SignableRequest) -> Result<String, SigningFailure> {
    let host = match request.headers().get(HOST) {
        Some(value) => String::from_utf8_lossy(value.as_bytes()).trim().to_owned(),
        None => request
            .uri()
            .authority()
            .map(|authority| {
                let authority = authority.as_str();
                authority
                    .rsplit_once('@')
                    .map_or(authority, |(_, host)| host)
                    .to_owned()
            })
            .unwrap_or_default(),
    };
    if host.is_empty() {
        return Err(SigningFailure::MissingHost);
    }

    let Some(stripped) = strip_default_port(request.uri().scheme_str(), &host) else {
        return Ok(host);
    };
    let stripped = stripped.to_owned();
    request
        .headers_mut()
        .insert(HOST, header_value(&HOST, &stripped)?);
    Ok(stripped)
}

/// The host without its port, if the port is the default for `scheme`.
fn strip_default_port<'a>(scheme: Option<&str>, host: &'a str) -> Option<&'a str> {
    let (name, port) = host.rsplit_once(':')?;
    if name.starts_with('[') && !name.ends_with(']') {
        // bare IPv6 address, no port
        return None;
    }
    let default = match scheme {
        Some("http") => "80",
        Some("https") => "443",
        _ => return None,
    };
    (port == default).then_some(name)
}

/// Replace the query of `uri` with an already-encoded query string.
fn with_raw_query(uri: &Uri, query: &str) -> Result<Uri, SigningFailure> {
    let path = match uri.path() {
        "" => "/",
        path => path,
    };
    let path_and_query = if query.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{query}")
    };
    let path_and_query = PathAndQuery::try_from(path_and_query)
        .map_err(|err| SigningFailure::InvalidUri(err.into()))?;

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Uri::from_parts(parts).map_err(|err| SigningFailure::InvalidUri(err.into()))
}

/// Render the presigned URL of a snapshot.
///
/// An opaque raw path renders as `scheme:opaque?query`; otherwise the raw
/// path, or the URI path, follows the original authority.
fn presigned_url(snapshot: &RequestSnapshot, query: &str) -> String {
    let uri = snapshot.uri();
    let scheme = uri.scheme_str().unwrap_or("https");
    match snapshot.raw_path() {
        Some(raw) if raw.is_opaque() => format!("{scheme}:{}?{query}", raw.as_str()),
        raw => {
            let path = raw.map_or_else(|| uri.path(), |raw| raw.path());
            let authority = uri.authority().map_or("", http::uri::Authority::as_str);
            format!("{scheme}://{authority}{path}?{query}")
        }
    }
}

fn header_value(name: &HeaderName, value: &str) -> Result<HeaderValue, SigningFailure> {
    HeaderValue::from_str(value).map_err(|source| SigningFailure::InvalidHeaderValue {
        name: name.as_str().to_owned(),
        source,
    })
}
