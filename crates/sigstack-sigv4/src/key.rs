//! Signing key derivation and signature computation.
//!
//! ```text
//! DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
//! DateRegionKey        = HMAC-SHA256(DateKey, region)
//! DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
//! SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
//! ```
//!
//! Keys are recomputed for every call and never cached.

use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};

use crate::scope::{CredentialScope, SCOPE_TERMINATOR};

/// Identifier of the signing algorithm.
pub const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";

const SECRET_KEY_PREFIX: &str = "AWS4";

type HmacSha256 = Hmac<Sha256>;

/// Derive the SigV4 signing key for a date, region and service.
///
/// An empty secret still produces a deterministic key; rejecting empty
/// credentials is up to the caller.
///
/// # Examples
///
/// ```
/// use sigstack_sigv4::key::derive_signing_key;
///
/// let key = derive_signing_key(
///     "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
///     "20130524",
///     "us-east-1",
///     "s3",
/// );
/// assert_eq!(key.len(), 32);
/// ```
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = hmac_sha256(
        format!("{SECRET_KEY_PREFIX}{secret_key}").as_bytes(),
        date.as_bytes(),
    );
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, SCOPE_TERMINATOR.as_bytes())
}

/// Derive the signing key for a credential scope.
#[must_use]
pub fn derive_scoped_signing_key(secret_key: &str, scope: &CredentialScope) -> Vec<u8> {
    derive_signing_key(secret_key, scope.date(), scope.region(), scope.service())
}

/// Build the string to sign.
///
/// ```text
/// AWS4-HMAC-SHA256\n
/// <ISO8601 timestamp>\n
/// <credential_scope>\n
/// <hex(SHA256(canonical_request))>
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request: &str,
) -> String {
    let canonical_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
    format!("{SIGNING_ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_hash}")
}

/// Compute the lower-case hex HMAC-SHA256 signature of `data`.
#[must_use]
pub fn compute_signature(signing_key: &[u8], data: &str) -> String {
    hex::encode(hmac_sha256(signing_key, data.as_bytes()))
}

/// Compute HMAC-SHA256 and return the raw bytes.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
