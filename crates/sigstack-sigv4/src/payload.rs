//! Payload digests.
//!
//! The signer never reads a body itself; callers pass a precomputed hex
//! SHA-256 digest or [`UNSIGNED_PAYLOAD`]. The helpers here compute that
//! digest from bytes or from a seekable reader.

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};

use sha2::{Digest, Sha256};

use crate::error::HashComputationError;

/// Payload hash sentinel for bodies that are not hashed.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Hex SHA-256 of the empty body.
pub const EMPTY_PAYLOAD_HASH: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Hex SHA-256 digest of `body`.
///
/// # Examples
///
/// ```
/// use sigstack_sigv4::payload::{EMPTY_PAYLOAD_HASH, hash_payload};
///
/// assert_eq!(hash_payload(b""), EMPTY_PAYLOAD_HASH);
/// ```
#[must_use]
pub fn hash_payload(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Hex SHA-256 digest of a seekable body.
///
/// The reader is rewound before hashing and rewound again afterwards, so
/// the body can still be sent in full.
pub fn compute_payload_hash<R: Read + Seek + ?Sized>(
    body: &mut R,
) -> Result<String, HashComputationError> {
    body.seek(SeekFrom::Start(0))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];
    loop {
        let n = body.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    body.seek(SeekFrom::Start(0))?;
    Ok(hex::encode(hasher.finalize()))
}

/// A request body whose digest the signing stage can compute.
pub trait PayloadBody {
    /// Hex SHA-256 of the body, leaving the body ready to be sent.
    fn payload_hash(&mut self) -> Result<String, HashComputationError>;
}

impl PayloadBody for () {
    fn payload_hash(&mut self) -> Result<String, HashComputationError> {
        Ok(EMPTY_PAYLOAD_HASH.to_owned())
    }
}

impl PayloadBody for Vec<u8> {
    fn payload_hash(&mut self) -> Result<String, HashComputationError> {
        Ok(hash_payload(self))
    }
}

impl PayloadBody for String {
    fn payload_hash(&mut self) -> Result<String, HashComputationError> {
        Ok(hash_payload(self.as_bytes()))
    }
}

impl PayloadBody for &[u8] {
    fn payload_hash(&mut self) -> Result<String, HashComputationError> {
        Ok(hash_payload(self))
    }
}

impl<T: AsRef<[u8]>> PayloadBody for Cursor<T> {
    fn payload_hash(&mut self) -> Result<String, HashComputationError> {
        compute_payload_hash(self)
    }
}

impl PayloadBody for File {
    fn payload_hash(&mut self) -> Result<String, HashComputationError> {
        compute_payload_hash(self)
    }
}

/// A forward-only body. Its digest cannot be computed without consuming
/// it, so it can only be signed with a preset hash or as
/// [`UNSIGNED_PAYLOAD`].
#[derive(Debug)]
pub struct Streaming<R>(pub R);

impl<R> PayloadBody for Streaming<R> {
    fn payload_hash(&mut self) -> Result<String, HashComputationError> {
        Err(HashComputationError::NotSeekable)
    }
}
