//! Configuration management for sigstack.
//!
//! All configuration is driven by environment variables.

use crate::error::{SigstackError, SigstackResult};
use crate::types::{AwsRegion, ServiceName};

/// Signing configuration shared by the signer and the binaries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningConfig {
    /// Region the signatures are scoped to.
    pub region: AwsRegion,
    /// Service signing name.
    pub service: ServiceName,
    /// Keep `X-Amz-*` headers out of presigned query strings.
    pub disable_header_hoisting: bool,
    /// Skip the second escaping pass over the canonical URI.
    pub disable_uri_path_escaping: bool,
    /// Emit canonical request and string to sign at debug level.
    pub log_signing: bool,
    /// Default lifetime of presigned URLs, in seconds.
    pub presign_expires_secs: u64,
    /// Log level.
    pub log_level: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            region: AwsRegion::default(),
            service: ServiceName::default(),
            disable_header_hoisting: false,
            disable_uri_path_escaping: false,
            log_signing: false,
            presign_expires_secs: 900,
            log_level: "info".to_owned(),
        }
    }
}

impl SigningConfig {
    /// Load configuration from environment variables.
    ///
    /// `AWS_REGION` takes precedence over `AWS_DEFAULT_REGION`.
    pub fn from_env() -> SigstackResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SigstackResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("AWS_REGION").or_else(|| lookup("AWS_DEFAULT_REGION")) {
            config.region = AwsRegion::new(v);
        }
        if let Some(v) = lookup("SIGSTACK_SERVICE") {
            config.service = ServiceName::new(v);
        }
        if let Some(v) = lookup("SIGSTACK_DISABLE_HEADER_HOISTING") {
            config.disable_header_hoisting = parse_bool(&v);
        }
        if let Some(v) = lookup("SIGSTACK_DISABLE_URI_PATH_ESCAPING") {
            config.disable_uri_path_escaping = parse_bool(&v);
        }
        if let Some(v) = lookup("SIGSTACK_LOG_SIGNING") {
            config.log_signing = parse_bool(&v);
        }
        if let Some(v) = lookup("SIGSTACK_PRESIGN_EXPIRES") {
            config.presign_expires_secs = v.trim().parse().map_err(|_| {
                SigstackError::Config(format!("SIGSTACK_PRESIGN_EXPIRES is not a number: {v}"))
            })?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }
}

fn parse_bool(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}
