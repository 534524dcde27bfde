//! Core types, configuration, and error handling for sigstack.
//!
//! This crate holds the pieces shared by the SigV4 signing engine and the
//! binaries built on top of it: environment-driven signing configuration,
//! the region and service name newtypes, and the top-level error type.

mod config;
mod error;
mod types;

pub use config::SigningConfig;
pub use error::{SigstackError, SigstackResult};
pub use types::{AwsRegion, ServiceName};
