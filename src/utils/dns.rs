//! DNS resolver construction and mail-exchanger lookup.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use std::net::IpAddr;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::proto::op::ResponseCode;
use trust_dns_resolver::TokioAsyncResolver;

/// The mail host selected for a domain.
#[derive(Debug, Clone)]
pub struct MailServer {
    /// MX exchange hostname, without the trailing dot.
    pub exchange: String,
    pub preference: u16,
}

/// Builds the shared resolver from configuration.
///
/// Uses the configured DNS servers when given, system defaults otherwise.
/// The configured timeout bounds every lookup; the orchestrator itself never
/// enforces one.
pub fn create_resolver(config: &Config) -> Result<TokioAsyncResolver> {
    let mut opts = ResolverOpts::default();
    opts.timeout = config.dns_timeout;
    opts.attempts = 1;

    if config.dns_servers.is_empty() {
        return Ok(TokioAsyncResolver::tokio(ResolverConfig::default(), opts));
    }

    let ips: Vec<IpAddr> = config
        .dns_servers
        .iter()
        .map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| AppError::Config(format!("Invalid DNS server '{}': {}", s, e)))
        })
        .collect::<Result<_>>()?;

    let group = NameServerConfigGroup::from_ips_clear(&ips, 53, true);
    let resolver_config = ResolverConfig::from_parts(None, vec![], group);
    Ok(TokioAsyncResolver::tokio(resolver_config, opts))
}

/// Resolves the lowest-preference mail exchanger for a domain.
///
/// Maps NXDOMAIN, empty answers, and resolver timeouts to distinct error
/// variants so callers can log the exact cause while treating them all as
/// `error(dns)`.
pub async fn resolve_mail_server(
    resolver: &TokioAsyncResolver,
    domain: &str,
) -> Result<MailServer> {
    let lookup = resolver.mx_lookup(domain).await.map_err(|e| match e.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => {
            if *response_code == ResponseCode::NXDomain {
                AppError::NxDomain(domain.to_string())
            } else {
                AppError::NoMxRecords(domain.to_string())
            }
        }
        ResolveErrorKind::Timeout => AppError::DnsTimeout(domain.to_string()),
        _ => AppError::Dns {
            domain: domain.to_string(),
            source: e,
        },
    })?;

    let best = lookup
        .iter()
        .min_by_key(|mx| mx.preference())
        .ok_or_else(|| AppError::NoMxRecords(domain.to_string()))?;

    let exchange = best
        .exchange()
        .to_utf8()
        .trim_end_matches('.')
        .to_string();
    if exchange.is_empty() {
        return Err(AppError::NoMxRecords(domain.to_string()));
    }

    tracing::debug!(
        target: "dns",
        "Resolved MX for {}: {} (preference {})",
        domain,
        exchange,
        best.preference()
    );
    Ok(MailServer {
        exchange,
        preference: best.preference(),
    })
}
