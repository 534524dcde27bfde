//! End-to-end signing scenarios for sigstack.
//!
//! These tests drive the public API only: a signer backed by a static
//! credentials provider, a signing clock pinned to a fixed wall-clock time,
//! and plain `http::Request` values.
//!
//! ```text
//! cargo test -p sigstack-integration
//! ```

use std::sync::{Arc, Once};

use chrono::{DateTime, Utc};
use sigstack_sigv4::{
    ClockSkew, Credentials, Signer, SignerOptions, SigningClock, SigningTime,
    StaticCredentialsProvider, WallClock,
};

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A wall clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl WallClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A signing clock over a [`FixedClock`] and the given skew cell.
#[must_use]
pub fn fixed_signing_clock(at: DateTime<Utc>, skew: Arc<ClockSkew>) -> SigningClock {
    SigningClock::with_wall_clock(Arc::new(FixedClock(at)), skew)
}

/// The Unix epoch as a signing time.
#[must_use]
pub fn epoch() -> SigningTime {
    SigningTime::from(DateTime::<Utc>::UNIX_EPOCH)
}

/// Temporary credentials with a session token.
#[must_use]
pub fn session_credentials() -> Credentials {
    Credentials::new("AKID", "SECRET").with_session_token("SESSION")
}

/// A signer over static credentials.
#[must_use]
pub fn signer(credentials: Credentials, options: SignerOptions) -> Signer {
    init_tracing();
    Signer::new(Arc::new(StaticCredentialsProvider::new(credentials))).with_options(options)
}

mod test_canonical;
mod test_header;
mod test_presign;
mod test_skew;
