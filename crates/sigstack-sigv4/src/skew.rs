//! Clock-skew tracking.
//!
//! [`ClockSkew`] is the one piece of process-wide mutable state in the
//! signer. Every signing call reads it; every response carrying a server
//! timestamp may overwrite it. Updates are plain last-writer-wins stores of
//! an `i64` nanosecond offset, so no lock is needed.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use tracing::{debug, trace};

/// Format of the HTTP `Date` header (`Mon, 02 Jan 2006 15:04:05 GMT`).
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Offset between the server clock and the local clock.
#[derive(Debug, Default)]
pub struct ClockSkew {
    nanos: AtomicI64,
}

impl ClockSkew {
    /// A zero offset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current offset.
    #[must_use]
    pub fn get(&self) -> TimeDelta {
        TimeDelta::nanoseconds(self.nanos.load(Ordering::Relaxed))
    }

    /// Replace the offset. Offsets beyond the `i64` nanosecond range
    /// (about 292 years) saturate.
    pub fn set(&self, skew: TimeDelta) {
        let nanos = skew.num_nanoseconds().unwrap_or(if skew < TimeDelta::zero() {
            i64::MIN
        } else {
            i64::MAX
        });
        self.nanos.store(nanos, Ordering::Relaxed);
    }
}

/// Parse an HTTP `Date` header value.
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), HTTP_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Response-side hook that feeds server time back into a [`ClockSkew`].
#[derive(Debug, Clone)]
pub struct SkewObserver {
    skew: Arc<ClockSkew>,
}

impl SkewObserver {
    /// Observe into the given skew cell.
    #[must_use]
    pub fn new(skew: Arc<ClockSkew>) -> Self {
        Self { skew }
    }

    /// The skew cell this observer writes to.
    #[must_use]
    pub fn skew(&self) -> &Arc<ClockSkew> {
        &self.skew
    }

    /// Record `server_time - local_request_time` as the new skew.
    pub fn observe(&self, server_time: DateTime<Utc>, local_request_time: DateTime<Utc>) -> TimeDelta {
        let skew = server_time - local_request_time;
        self.skew.set(skew);
        debug!(skew_ms = skew.num_milliseconds(), "Updated clock skew");
        skew
    }

    /// Record the skew implied by an HTTP `Date` value. Missing or
    /// unparsable values leave the skew untouched.
    pub fn observe_http_date(
        &self,
        value: Option<&str>,
        local_request_time: DateTime<Utc>,
    ) -> Option<TimeDelta> {
        let Some(value) = value else {
            trace!("Response carries no server time, skew unchanged");
            return None;
        };
        let Some(server_time) = parse_http_date(value) else {
            trace!(value, "Unparsable server time, skew unchanged");
            return None;
        };
        Some(self.observe(server_time, local_request_time))
    }

    /// Record the skew from a response's `Date` header.
    pub fn observe_response<B>(
        &self,
        response: &http::Response<B>,
        local_request_time: DateTime<Utc>,
    ) -> Option<TimeDelta> {
        let value = response
            .headers()
            .get(http::header::DATE)
            .and_then(|v| v.to_str().ok());
        self.observe_http_date(value, local_request_time)
    }
}
