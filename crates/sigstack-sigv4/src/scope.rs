//! Credential scope construction and parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::SigningFailure;
use crate::time::SigningTime;

/// Fixed terminator closing every SigV4 credential scope.
pub const SCOPE_TERMINATOR: &str = "aws4_request";

/// The `date/region/service/aws4_request` string binding a signature to a
/// day, a region and a service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialScope {
    date: String,
    region: String,
    service: String,
}

impl CredentialScope {
    /// Build the scope for a signing time, region and service.
    ///
    /// Empty region or service values are accepted and produce a scope the
    /// service will reject.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{DateTime, Utc};
    /// use sigstack_sigv4::scope::CredentialScope;
    /// use sigstack_sigv4::time::SigningTime;
    ///
    /// let time = SigningTime::from(DateTime::<Utc>::UNIX_EPOCH);
    /// let scope = CredentialScope::new(&time, "us-east-1", "dynamodb");
    /// assert_eq!(scope.to_string(), "19700101/us-east-1/dynamodb/aws4_request");
    /// ```
    #[must_use]
    pub fn new(time: &SigningTime, region: &str, service: &str) -> Self {
        Self {
            date: time.short_date(),
            region: region.to_owned(),
            service: service.to_owned(),
        }
    }

    /// Parse a scope string back into its components.
    pub fn parse(scope: &str) -> Result<Self, SigningFailure> {
        let parts: Vec<&str> = scope.splitn(4, '/').collect();
        match parts.as_slice() {
            [date, region, service, SCOPE_TERMINATOR]
                if date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit()) =>
            {
                Ok(Self {
                    date: (*date).to_owned(),
                    region: (*region).to_owned(),
                    service: (*service).to_owned(),
                })
            }
            _ => Err(SigningFailure::InvalidCredentialScope(scope.to_owned())),
        }
    }

    /// Short date (`YYYYMMDD`).
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Region component.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Service component.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }
}

impl fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{SCOPE_TERMINATOR}",
            self.date, self.region, self.service
        )
    }
}

impl FromStr for CredentialScope {
    type Err = SigningFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
