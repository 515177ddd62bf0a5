//! Domain and URL handling helpers.

use crate::core::error::{AppError, Result};
use url::Url;

/// Extracts the bare domain ("acme.com") from a website URL or domain string.
///
/// Adds an `https://` scheme when missing, strips a leading `www.`, and
/// lowercases the host. Errors when no plausible host can be recovered.
pub fn extract_domain(website: &str) -> Result<String> {
    let trimmed = website.trim();
    if trimmed.is_empty() {
        return Err(AppError::DomainExtraction("input is empty".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&with_scheme)?;
    let host = url.host_str().ok_or_else(|| {
        AppError::DomainExtraction(format!("no host component in '{}'", trimmed))
    })?;

    let domain = host.strip_prefix("www.").unwrap_or(host).to_lowercase();
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(AppError::DomainExtraction(format!(
            "extracted domain looks invalid: {}",
            domain
        )));
    }
    Ok(domain)
}

/// Normalizes a website string to its scheme+host origin URL.
///
/// Path, query, and fragment are discarded; the scraper builds its own page
/// set from the origin. Errors on malformed input or a missing host.
pub fn origin_url(website: &str) -> Result<Url> {
    let trimmed = website.trim();
    if trimmed.is_empty() {
        return Err(AppError::DomainExtraction(
            "website URL input is empty".to_string(),
        ));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&with_scheme)?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(AppError::UrlParse(url::ParseError::EmptyHost));
    }

    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    Ok(origin)
}
