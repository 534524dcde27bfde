//! Request-pipeline stages around the signer.
//!
//! A stage owns the collaborators a single signing call needs: the
//! credentials provider, a signer behind its capability trait and the
//! signing clock. The payload hash travels in a [`SigningContext`] so an
//! earlier step (or the caller) can preset it.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use http::header::HeaderName;
use http::header::HeaderValue;

use crate::clock::SigningClock;
use crate::credentials::{CredentialsProvider, retrieve_unexpired};
use crate::error::{HashComputationError, SignerError, SigningFailure};
use crate::payload::{PayloadBody, UNSIGNED_PAYLOAD};
use crate::signer::{HeaderSigner, PresignedRequest, QuerySigner, SignedRequest, SigningParams};

/// Header echoing the payload hash, required by S3.
pub const CONTENT_SHA256_HEADER: &str = "x-amz-content-sha256";

/// How a stage fills in a payload hash the context does not carry yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadHashing {
    /// Hash the request body.
    Compute,
    /// Sign with `UNSIGNED-PAYLOAD`.
    Unsigned,
}

/// Per-request signing inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    /// Service signing name.
    pub service: String,
    /// Signing region.
    pub region: String,
    /// Hex SHA-256 of the body, or `UNSIGNED-PAYLOAD`, once known.
    pub payload_hash: Option<String>,
}

impl SigningContext {
    /// A context without a payload hash.
    #[must_use]
    pub fn new(service: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            region: region.into(),
            payload_hash: None,
        }
    }

    /// Preset the payload hash.
    #[must_use]
    pub fn with_payload_hash(mut self, payload_hash: impl Into<String>) -> Self {
        self.payload_hash = Some(payload_hash.into());
        self
    }

    /// Fill in the payload hash unless one is already set.
    pub fn resolve_payload_hash<B: PayloadBody + ?Sized>(
        &mut self,
        hashing: PayloadHashing,
        body: &mut B,
    ) -> Result<(), HashComputationError> {
        if self.payload_hash.as_deref().is_some_and(|h| !h.is_empty()) {
            return Ok(());
        }
        let hash = match hashing {
            PayloadHashing::Compute => body.payload_hash()?,
            PayloadHashing::Unsigned => UNSIGNED_PAYLOAD.to_owned(),
        };
        self.payload_hash = Some(hash);
        Ok(())
    }

    /// The payload hash, failing when none was computed.
    pub fn payload_hash(&self) -> Result<&str, SigningFailure> {
        self.payload_hash
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or(SigningFailure::MissingPayloadHash)
    }
}

/// Set `x-amz-content-sha256` to the payload hash.
pub fn set_content_sha256_header(
    headers: &mut HeaderMap,
    payload_hash: &str,
) -> Result<(), SigningFailure> {
    let value = HeaderValue::from_str(payload_hash).map_err(|source| {
        SigningFailure::InvalidHeaderValue {
            name: CONTENT_SHA256_HEADER.to_owned(),
            source,
        }
    })?;
    headers.insert(HeaderName::from_static(CONTENT_SHA256_HEADER), value);
    Ok(())
}

/// Signs outgoing requests through the `Authorization` header.
#[derive(Debug, Clone)]
pub struct SignHttpRequestStage {
    credentials: Arc<dyn CredentialsProvider>,
    signer: Arc<dyn HeaderSigner>,
    clock: SigningClock,
    payload_hashing: Option<PayloadHashing>,
    content_sha256_header: bool,
}

impl SignHttpRequestStage {
    /// A stage that expects the payload hash to be preset.
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialsProvider>,
        signer: Arc<dyn HeaderSigner>,
        clock: SigningClock,
    ) -> Self {
        Self {
            credentials,
            signer,
            clock,
            payload_hashing: None,
            content_sha256_header: false,
        }
    }

    /// Fill in missing payload hashes.
    #[must_use]
    pub fn with_payload_hashing(mut self, hashing: PayloadHashing) -> Self {
        self.payload_hashing = Some(hashing);
        self
    }

    /// Also send the payload hash as `x-amz-content-sha256`.
    #[must_use]
    pub fn with_content_sha256_header(mut self, enabled: bool) -> Self {
        self.content_sha256_header = enabled;
        self
    }

    /// The clock signing times are read from.
    #[must_use]
    pub fn clock(&self) -> &SigningClock {
        &self.clock
    }

    /// Sign `request` at the clock's current, skew-corrected time.
    ///
    /// Fails with [`SigningFailure::MissingPayloadHash`] before consulting
    /// the credentials provider when no hash is available.
    pub async fn sign<B: PayloadBody>(
        &self,
        request: &mut http::Request<B>,
        ctx: &mut SigningContext,
    ) -> Result<SignedRequest, SignerError> {
        if let Some(hashing) = self.payload_hashing {
            ctx.resolve_payload_hash(hashing, request.body_mut())?;
        }
        let payload_hash = ctx.payload_hash()?.to_owned();

        let signing_time = self.clock.now();
        let credentials =
            retrieve_unexpired(self.credentials.as_ref(), signing_time.as_datetime()).await?;

        if self.content_sha256_header {
            set_content_sha256_header(request.headers_mut(), &payload_hash)?;
        }
        let params = SigningParams::new(&payload_hash, &ctx.service, &ctx.region, signing_time);
        self.signer.sign_header(request, &credentials, &params)
    }
}

/// Produces presigned URLs for outgoing requests.
#[derive(Debug, Clone)]
pub struct PresignStage {
    credentials: Arc<dyn CredentialsProvider>,
    signer: Arc<dyn QuerySigner>,
    clock: SigningClock,
    expires: Duration,
}

impl PresignStage {
    /// A stage issuing URLs valid for `expires`.
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialsProvider>,
        signer: Arc<dyn QuerySigner>,
        clock: SigningClock,
        expires: Duration,
    ) -> Self {
        Self {
            credentials,
            signer,
            clock,
            expires,
        }
    }

    /// Presign `request`. Without a preset payload hash the URL is signed
    /// with `UNSIGNED-PAYLOAD`.
    pub async fn presign<B>(
        &self,
        request: &http::Request<B>,
        ctx: &SigningContext,
    ) -> Result<PresignedRequest, SignerError> {
        let payload_hash = ctx
            .payload_hash
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or(UNSIGNED_PAYLOAD);

        let signing_time = self.clock.now();
        let credentials =
            retrieve_unexpired(self.credentials.as_ref(), signing_time.as_datetime()).await?;

        let params = SigningParams::new(payload_hash, &ctx.service, &ctx.region, signing_time);
        self.signer
            .sign_query(request, &credentials, &params, self.expires)
    }
}
