//! Web fallback scraper: best-effort discovery of a published contact email.
//!
//! Used only when SMTP verification could not produce a confident result for
//! at least one person at a company. Crawls a small, same-host set of pages
//! (homepage, link-harvested contact/about/team pages, and a fixed set of
//! conventional paths), preferring explicit mailto links over text matches.

use crate::core::config::{random_delay, Config};
use crate::core::error::Result;
use crate::utils::domain::origin_url;

use percent_encoding::percent_decode_str;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Substrings that mark an email-shaped token as a false positive: image
/// filename artifacts and site-builder placeholder domains.
const FALSE_POSITIVE_MARKERS: &[&str] = &[".png", ".jpg", "example.com", "wix.com"];

/// Scrapes company websites for a published contact address.
#[derive(Clone)]
pub struct PublishedEmailScraper {
    http: reqwest::Client,
    config: Arc<Config>,
}

impl PublishedEmailScraper {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Finds the best published email for a website, or `None`.
    ///
    /// Malformed URLs fail fast. Per-page fetch failures are skipped; an
    /// unreachable homepage still leaves the conventional fallback paths to
    /// try.
    pub async fn find_published_email(&self, website: &str) -> Option<String> {
        let origin = match origin_url(website) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(target: "scrape", "Invalid website URL '{}': {}", website, e);
                return None;
            }
        };

        let pages = self.gather_candidate_pages(&origin).await;
        let mut visited: HashSet<String> = HashSet::new();
        let mut first_fetch = true;

        for page in pages {
            if !visited.insert(page.as_str().to_string()) {
                continue;
            }
            if !first_fetch {
                tokio::time::sleep(random_delay(self.config.page_delay)).await;
            }
            first_fetch = false;

            tracing::debug!(target: "scrape", "Checking page: {}", page);
            let body = match self.fetch_page(&page).await {
                Some(body) => body,
                None => continue,
            };

            // Mailto links are authoritative when present on a page.
            let mailtos = extract_mailto_emails(&body, &self.config);
            if !mailtos.is_empty() {
                let best = rank_best(mailtos);
                tracing::info!(target: "scrape", "Found mailto on {} -> {}", page, best);
                return Some(best);
            }

            if let Some(email) = find_email_in_visible_text(&body, &self.config) {
                tracing::info!(target: "scrape", "Found text email on {} -> {}", page, email);
                return Some(email);
            }
        }

        tracing::info!(target: "scrape", "No published email found for {}", origin);
        None
    }

    /// Builds the bounded page set: origin, harvested same-host links whose
    /// href or anchor text mentions a configured keyword, then the fixed
    /// fallback paths.
    async fn gather_candidate_pages(&self, origin: &Url) -> Vec<Url> {
        let mut pages = vec![origin.clone()];
        let mut seen: HashSet<String> = pages.iter().map(|u| u.as_str().to_string()).collect();

        match self.fetch_page(origin).await {
            Some(body) => {
                for link in harvest_contact_links(&body, origin, &self.config.scrape_link_keywords)
                {
                    if seen.insert(link.as_str().to_string()) {
                        pages.push(link);
                    }
                }
            }
            None => {
                tracing::warn!(target: "scrape", "Could not access homepage {}", origin);
            }
        }

        // The conventional paths must survive the page bound even when the
        // homepage is link-heavy, so harvested links are trimmed first.
        let reserved = self.config.scrape_fallback_paths.len();
        pages.truncate(
            self.config
                .max_pages_per_site
                .saturating_sub(reserved)
                .max(1),
        );
        let mut seen: HashSet<String> = pages.iter().map(|u| u.as_str().to_string()).collect();
        for path in &self.config.scrape_fallback_paths {
            if let Ok(url) = origin.join(path) {
                if seen.insert(url.as_str().to_string()) {
                    pages.push(url);
                }
            }
        }

        pages.truncate(self.config.max_pages_per_site);
        pages
    }

    /// Fetches one page, returning `None` on any failure (non-fatal).
    async fn fetch_page(&self, url: &Url) -> Option<String> {
        let response = match self.http.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(target: "scrape", "Failed to fetch {}: {}", url, e);
                return None;
            }
        };
        match response.error_for_status() {
            Ok(response) => match response.text().await {
                Ok(body) => Some(body),
                Err(e) => {
                    tracing::debug!(target: "scrape", "Failed to read body of {}: {}", url, e);
                    None
                }
            },
            Err(e) => {
                tracing::debug!(target: "scrape", "Skipping {}: {}", url, e);
                None
            }
        }
    }
}

/// Collects same-host links whose href or anchor text contains a keyword.
fn harvest_contact_links(html: &str, origin: &Url, keywords: &[String]) -> Vec<Url> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").expect("static selector");
    let mut links = Vec::new();

    for element in document.select(&anchors) {
        let href = match element.value().attr("href") {
            Some(href) => href,
            None => continue,
        };
        let href_lower = href.to_lowercase();
        let text_lower = element.text().collect::<String>().to_lowercase();

        if !keywords
            .iter()
            .any(|kw| href_lower.contains(kw) || text_lower.contains(kw))
        {
            continue;
        }
        if let Ok(resolved) = origin.join(href) {
            if resolved.host_str() == origin.host_str() {
                links.push(resolved);
            }
        }
    }
    links
}

/// Extracts and validates addresses from mailto links on a page.
fn extract_mailto_emails(html: &str, config: &Config) -> Vec<String> {
    let document = Html::parse_document(html);
    let mailto = Selector::parse(r#"a[href^="mailto:"]"#).expect("static selector");
    let mut emails = Vec::new();

    for element in document.select(&mailto) {
        let href = match element.value().attr("href") {
            Some(href) => href,
            None => continue,
        };
        let raw = href
            .trim_start_matches("mailto:")
            .split('?')
            .next()
            .unwrap_or("");
        let decoded = percent_decode_str(raw).decode_utf8_lossy();
        let email = decoded.trim().to_string();
        if is_full_email(&email, config) {
            emails.push(email);
        }
    }
    emails
}

/// Preference order for published addresses: inbox-style first, support
/// second, everything else last.
fn mailto_rank(email: &str) -> u8 {
    let lower = email.to_lowercase();
    if lower.contains("info@") || lower.contains("contact@") {
        0
    } else if lower.contains("support@") {
        1
    } else {
        2
    }
}

/// Picks the top-ranked address; the sort is stable, so page order breaks
/// ties.
fn rank_best(mut emails: Vec<String>) -> String {
    emails.sort_by_key(|e| mailto_rank(e));
    emails.into_iter().next().expect("non-empty email list")
}

/// Searches a page's visible text for the first plausible email token.
/// Script, style, and noscript content never counts as visible.
fn find_email_in_visible_text(html: &str, config: &Config) -> Option<String> {
    let document = Html::parse_document(html);
    let mut text = String::new();

    for node in document.tree.nodes() {
        if let Some(fragment) = node.value().as_text() {
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|el| matches!(el.name(), "script" | "style" | "noscript"))
                    .unwrap_or(false)
            });
            if !hidden {
                text.push_str(fragment);
                text.push(' ');
            }
        }
    }

    let candidate = config.email_regex.find(&text)?.as_str().to_string();
    if FALSE_POSITIVE_MARKERS
        .iter()
        .any(|marker| candidate.contains(marker))
    {
        tracing::debug!(target: "scrape", "Rejected false-positive token: {}", candidate);
        return None;
    }
    Some(candidate)
}

/// True when the whole string (not a substring) matches the email pattern.
fn is_full_email(s: &str, config: &Config) -> bool {
    config
        .email_regex
        .find(s)
        .map(|m| m.start() == 0 && m.end() == s.len())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_mailto_rank_order() {
        assert_eq!(mailto_rank("info@acme.com"), 0);
        assert_eq!(mailto_rank("contact@acme.com"), 0);
        assert_eq!(mailto_rank("support@acme.com"), 1);
        assert_eq!(mailto_rank("jane@acme.com"), 2);
    }

    #[test]
    fn test_rank_best_prefers_info_over_support() {
        let best = rank_best(vec![
            "support@acme.com".to_string(),
            "info@acme.com".to_string(),
        ]);
        assert_eq!(best, "info@acme.com");
    }

    #[test]
    fn test_extract_mailtos_decodes_and_validates() {
        let html = r#"
            <html><body>
                <a href="mailto:info%40acme.com?subject=Hi">Email us</a>
                <a href="mailto:not-an-email">broken</a>
                <a href="mailto:support@acme.com">Support</a>
            </body></html>"#;
        let emails = extract_mailto_emails(html, &test_config());
        assert_eq!(emails, vec!["info@acme.com", "support@acme.com"]);
    }

    #[test]
    fn test_visible_text_skips_scripts_and_styles() {
        let html = r#"
            <html><head><style>.x { content: "style@acme.com"; }</style></head>
            <body>
                <script>var s = "script@acme.com";</script>
                <noscript>noscript@acme.com</noscript>
                <p>Reach us at hello@acme.com today.</p>
            </body></html>"#;
        let found = find_email_in_visible_text(html, &test_config());
        assert_eq!(found, Some("hello@acme.com".to_string()));
    }

    #[test]
    fn test_false_positives_rejected() {
        let html = r#"<html><body><p>logo@2x.png and demo@example.com only</p></body></html>"#;
        assert_eq!(find_email_in_visible_text(html, &test_config()), None);
    }

    #[test]
    fn test_harvest_links_same_host_only() {
        let origin = Url::parse("https://acme.com/").unwrap();
        let html = r#"
            <html><body>
                <a href="/contact">Contact</a>
                <a href="https://acme.com/team">Our Team</a>
                <a href="https://other.com/contact">External</a>
                <a href="/pricing">Pricing</a>
                <a href="/company">About the company</a>
            </body></html>"#;
        let keywords = vec![
            "contact".to_string(),
            "about".to_string(),
            "team".to_string(),
        ];
        let links = harvest_contact_links(html, &origin, &keywords);
        let strings: Vec<_> = links.iter().map(|u| u.as_str()).collect();
        assert!(strings.contains(&"https://acme.com/contact"));
        assert!(strings.contains(&"https://acme.com/team"));
        // Anchor-text match counts even when the href does not.
        assert!(strings.contains(&"https://acme.com/company"));
        assert!(!strings.iter().any(|s| s.contains("other.com")));
        assert!(!strings.iter().any(|s| s.contains("pricing")));
    }
}
