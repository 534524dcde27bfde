//! Credentials and the providers that resolve them.
//!
//! The signer never caches or refreshes credentials; it asks a
//! [`CredentialsProvider`] once per signing call. Cancelling a pending
//! retrieval is done by dropping the returned future.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A resolved credential set.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key ID, safe to log.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token for temporary credentials.
    pub session_token: Option<String>,
    /// When temporary credentials stop being valid.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Long-lived credentials without a session token.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            expires_at: None,
        }
    }

    /// Attach a session token.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Attach an expiry.
    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the credentials have expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// The session token, treating an empty string as absent.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref().filter(|t| !t.is_empty())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "** redacted **"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Errors raised while resolving credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    /// The provider has nothing to return.
    #[error("credentials not loaded: {0}")]
    NotLoaded(String),

    /// The resolved credentials are past their expiry.
    #[error("credentials expired at {0}")]
    Expired(DateTime<Utc>),

    /// Any other provider failure (network fetch, parse error, ...).
    #[error("credentials provider error: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Source of credentials for signing.
///
/// Implementations may block on the network; callers abandon a retrieval by
/// dropping the future.
#[async_trait]
pub trait CredentialsProvider: Send + Sync + fmt::Debug {
    /// Resolve the credentials to sign with.
    async fn retrieve(&self) -> Result<Credentials, CredentialsError>;
}

/// Retrieve credentials from `provider`, refusing a set already expired at
/// `now`.
pub async fn retrieve_unexpired(
    provider: &dyn CredentialsProvider,
    now: DateTime<Utc>,
) -> Result<Credentials, CredentialsError> {
    let credentials = provider.retrieve().await?;
    match credentials.expires_at {
        Some(expires_at) if credentials.is_expired(now) => {
            Err(CredentialsError::Expired(expires_at))
        }
        _ => Ok(credentials),
    }
}

/// A provider that always returns the same credentials.
///
/// # Examples
///
/// ```
/// use sigstack_sigv4::credentials::{Credentials, StaticCredentialsProvider};
///
/// let provider = StaticCredentialsProvider::new(Credentials::new("AKID", "SECRET"));
/// assert_eq!(provider.credentials().access_key_id, "AKID");
/// ```
#[derive(Debug, Clone)]
pub struct StaticCredentialsProvider {
    credentials: Credentials,
}

impl StaticCredentialsProvider {
    /// Wrap a fixed credential set.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// The wrapped credentials.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentialsProvider {
    async fn retrieve(&self) -> Result<Credentials, CredentialsError> {
        Ok(self.credentials.clone())
    }
}

/// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and
/// `AWS_SESSION_TOKEN` from the environment on every retrieval.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialsProvider;

impl EnvCredentialsProvider {
    /// Create the provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Credentials, CredentialsError> {
        let access_key_id = lookup("AWS_ACCESS_KEY_ID")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CredentialsError::NotLoaded("AWS_ACCESS_KEY_ID is not set".to_owned()))?;
        let secret_access_key = lookup("AWS_SECRET_ACCESS_KEY")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                CredentialsError::NotLoaded("AWS_SECRET_ACCESS_KEY is not set".to_owned())
            })?;

        let mut credentials = Credentials::new(access_key_id, secret_access_key);
        if let Some(token) = lookup("AWS_SESSION_TOKEN").filter(|v| !v.is_empty()) {
            credentials = credentials.with_session_token(token);
        }
        Ok(credentials)
    }
}

#[async_trait]
impl CredentialsProvider for EnvCredentialsProvider {
    async fn retrieve(&self) -> Result<Credentials, CredentialsError> {
        Self::load(|key| std::env::var(key).ok())
    }
}
