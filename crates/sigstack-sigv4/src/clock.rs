//! The signing clock: wall-clock time shifted by the observed skew.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::skew::ClockSkew;
use crate::time::SigningTime;

/// Source of wall-clock time.
pub trait WallClock: Send + Sync + fmt::Debug {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Produces signing times corrected by a shared [`ClockSkew`].
///
/// The clock only reads the skew; [`crate::skew::SkewObserver`] writes it.
#[derive(Debug, Clone)]
pub struct SigningClock {
    wall: Arc<dyn WallClock>,
    skew: Arc<ClockSkew>,
}

impl SigningClock {
    /// System clock corrected by `skew`.
    #[must_use]
    pub fn new(skew: Arc<ClockSkew>) -> Self {
        Self::with_wall_clock(Arc::new(SystemClock), skew)
    }

    /// Custom wall clock corrected by `skew`.
    #[must_use]
    pub fn with_wall_clock(wall: Arc<dyn WallClock>, skew: Arc<ClockSkew>) -> Self {
        Self { wall, skew }
    }

    /// Uncorrected wall-clock time.
    #[must_use]
    pub fn wall_time(&self) -> DateTime<Utc> {
        self.wall.now()
    }

    /// `wall_clock_time() + ClockSkew`.
    #[must_use]
    pub fn now(&self) -> SigningTime {
        SigningTime::from(self.wall.now() + self.skew.get())
    }

    /// The skew cell read by this clock.
    #[must_use]
    pub fn skew(&self) -> &Arc<ClockSkew> {
        &self.skew
    }
}

impl Default for SigningClock {
    fn default() -> Self {
        Self::new(Arc::new(ClockSkew::new()))
    }
}
