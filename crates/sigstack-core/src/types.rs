//! Region and service identifiers used to scope signatures.

use std::fmt;

/// AWS Region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Region used when nothing else is configured.
    pub const DEFAULT: &str = "us-east-1";

    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AwsRegion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signing name of a service (`s3`, `dynamodb`, `sqs`, ...).
///
/// This is the name that appears in the credential scope, which is not
/// always the same as the endpoint prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ServiceName(String);

impl ServiceName {
    /// Service used when nothing else is configured.
    pub const DEFAULT: &str = "s3";

    /// Create a new service name.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self(service.into())
    }

    /// Get the service name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the service expects the canonical URI without a second
    /// escaping pass (the S3 family).
    #[must_use]
    pub fn is_s3_family(&self) -> bool {
        matches!(self.0.as_str(), "s3" | "s3-object-lambda" | "s3-outposts" | "s3express")
    }
}

impl Default for ServiceName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
