//! Error types shared across the library.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;

/// All error conditions the pipeline distinguishes.
///
/// Per-unit failures (one domain's DNS lookup, one page's fetch) are mapped to
/// terminal outcomes by the orchestrator and never abort a run; variants here
/// exist so the originating cause can be logged distinctly.
#[derive(Debug, Error)]
pub enum AppError {
    /// Domain does not exist (NXDOMAIN).
    #[error("domain does not exist: {0}")]
    NxDomain(String),

    /// Domain exists but publishes no MX records.
    #[error("no MX records for domain: {0}")]
    NoMxRecords(String),

    /// DNS resolution did not complete within the configured timeout.
    #[error("DNS lookup timed out for domain: {0}")]
    DnsTimeout(String),

    /// Any other resolver failure (no nameservers, transport errors).
    #[error("DNS resolution failed for {domain}: {source}")]
    Dns {
        domain: String,
        #[source]
        source: trust_dns_resolver::error::ResolveError,
    },

    /// Could not establish an SMTP session with the mail host.
    #[error("SMTP connection to {server} failed: {detail}")]
    SmtpConnect { server: String, detail: String },

    /// The SMTP session failed partway through the probe sequence.
    #[error("SMTP session with {server} failed: {detail}")]
    SmtpSession { server: String, detail: String },

    #[error("invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("cannot extract domain: {0}")]
    DomainExtraction(String),

    #[error("HTTP fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
