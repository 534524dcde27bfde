//! Error types for SigV4 signing.
//!
//! Failures fall into three kinds: the credentials could not be resolved,
//! the payload could not be hashed, or the signer was handed state it
//! cannot sign. Every variant is returned synchronously; nothing is retried.

use crate::credentials::CredentialsError;

/// Errors returned by the signing entry points.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The credentials provider failed; its error is passed through as-is.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// The request body could not be read to compute its digest.
    #[error("failed to compute payload hash: {0}")]
    HashComputation(#[from] HashComputationError),

    /// The request could not be signed.
    #[error("failed to sign request: {0}")]
    Signing(#[from] SigningFailure),
}

/// Reasons a payload digest could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum HashComputationError {
    /// The body cannot be rewound, so hashing it would consume it.
    #[error("request payload is not seekable")]
    NotSeekable,

    /// Reading or seeking the body failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Malformed state that reached the signer core.
#[derive(Debug, thiserror::Error)]
pub enum SigningFailure {
    /// No payload hash was computed for the request.
    #[error("computed payload hash missing")]
    MissingPayloadHash,

    /// The access key ID or secret access key is empty.
    #[error("credentials have an empty access key ID or secret access key")]
    EmptyCredentials,

    /// Neither a `Host` header nor a URI authority is available.
    #[error("request has no host to sign")]
    MissingHost,

    /// A value produced while signing is not a valid header value.
    #[error("invalid value for header {name}")]
    InvalidHeaderValue {
        /// Name of the header being written.
        name: String,
        /// Underlying cause.
        #[source]
        source: http::header::InvalidHeaderValue,
    },

    /// The rewritten request URI is invalid.
    #[error("invalid request URI")]
    InvalidUri(#[from] http::Error),

    /// A credential scope string does not have the
    /// `date/region/service/aws4_request` shape.
    #[error("invalid credential scope: {0}")]
    InvalidCredentialScope(String),
}
