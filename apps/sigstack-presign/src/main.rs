//! sigstack-presign - sign or presign a single request from the command line.
//!
//! Reads the request and signing configuration from the environment, signs it
//! with credentials from `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` /
//! `AWS_SESSION_TOKEN`, and prints the result to stdout.
//!
//! # Usage
//!
//! ```text
//! SIGSTACK_URL=https://examplebucket.s3.amazonaws.com/test.txt sigstack-presign
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SIGSTACK_URL` | *(required)* | Request URL |
//! | `SIGSTACK_METHOD` | `GET` | Request method |
//! | `SIGSTACK_MODE` | `presign` | `presign` or `header` |
//! | `SIGSTACK_PAYLOAD_HASH` | `UNSIGNED-PAYLOAD` | Hex SHA-256 of the body |
//! | `AWS_REGION` | `us-east-1` | Signing region |
//! | `SIGSTACK_SERVICE` | `s3` | Signing service |
//! | `SIGSTACK_PRESIGN_EXPIRES` | `900` | Presigned URL lifetime in seconds |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use http::Method;
use sigstack_core::SigningConfig;
use sigstack_sigv4::{
    EnvCredentialsProvider, PresignedRequest, Signer, SignerOptions, SigningClock, SigningParams,
    UNSIGNED_PAYLOAD,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Binary version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
/// Logs go to stderr so stdout only carries the signing result.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Where the signature goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Presign,
    Header,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "presign" | "query" => Ok(Self::Presign),
            "header" => Ok(Self::Header),
            other => anyhow::bail!("unknown signing mode: {other}"),
        }
    }
}

/// The request to sign.
#[derive(Debug, Clone)]
struct RequestOptions {
    url: String,
    method: Method,
    mode: Mode,
    payload_hash: String,
}

impl RequestOptions {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup("SIGSTACK_URL").context("SIGSTACK_URL is not set")?;
        let method = lookup("SIGSTACK_METHOD")
            .map(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()))
            .transpose()
            .context("invalid SIGSTACK_METHOD")?
            .unwrap_or(Method::GET);
        let mode = lookup("SIGSTACK_MODE")
            .map(|m| m.parse::<Mode>())
            .transpose()?
            .unwrap_or(Mode::Presign);
        let payload_hash = lookup("SIGSTACK_PAYLOAD_HASH")
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| UNSIGNED_PAYLOAD.to_owned());

        Ok(Self {
            url,
            method,
            mode,
            payload_hash,
        })
    }

    fn build_request(&self) -> Result<http::Request<()>> {
        http::Request::builder()
            .method(self.method.clone())
            .uri(self.url.as_str())
            .body(())
            .with_context(|| format!("invalid request url: {}", self.url))
    }
}

/// Render a presigned URL followed by the headers that must accompany it.
fn render_presigned(presigned: &PresignedRequest) -> String {
    let mut out = presigned.url.clone();
    for (name, value) in &presigned.signed_headers {
        let _ = write!(out, "\n{name}: {}", String::from_utf8_lossy(value.as_bytes()));
    }
    out
}

/// Render a header-signed request as a request line and its headers.
fn render_signed(request: &http::Request<()>) -> String {
    let mut out = format!("{} {}", request.method(), request.uri());
    for (name, value) in request.headers() {
        let _ = write!(out, "\n{name}: {}", String::from_utf8_lossy(value.as_bytes()));
    }
    out
}

async fn run(config: &SigningConfig, options: &RequestOptions, signer: &Signer) -> Result<String> {
    let params = SigningParams::new(
        &options.payload_hash,
        config.service.as_str(),
        config.region.as_str(),
        SigningClock::default().now(),
    );

    match options.mode {
        Mode::Presign => {
            let request = options.build_request()?;
            let expires = Duration::from_secs(config.presign_expires_secs);
            let presigned = signer
                .presign_http(&request, &params, expires)
                .await
                .context("failed to presign request")?;
            Ok(render_presigned(&presigned))
        }
        Mode::Header => {
            let mut request = options.build_request()?;
            signer
                .sign_http(&mut request, &params)
                .await
                .context("failed to sign request")?;
            Ok(render_signed(&request))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = SigningConfig::from_env().context("failed to load signing configuration")?;

    init_tracing(&config.log_level)?;

    let options = RequestOptions::from_lookup(|key| std::env::var(key).ok())?;

    info!(
        method = %options.method,
        mode = ?options.mode,
        service = %config.service,
        region = %config.region,
        version = VERSION,
        "signing request",
    );

    let signer = Signer::new(Arc::new(EnvCredentialsProvider::new()))
        .with_options(SignerOptions::from(&config));
    let output = run(&config, &options, &signer).await?;
    println!("{output}");

    Ok(())
}
