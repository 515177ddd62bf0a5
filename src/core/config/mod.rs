//! Application configuration: the effective [`Config`] struct, the TOML file
//! schema ([`ConfigFile`]), and the fluent [`ConfigBuilder`].

mod builder;
mod loading;
mod validation;

pub use builder::ConfigBuilder;

use crate::core::error::Result;
use rand::Rng;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;

/// Shape of an email-looking token. Mirrors the one used for mailto
/// validation and visible-text extraction.
const EMAIL_PATTERN: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}";

/// Effective configuration, passed into the pipeline at construction.
///
/// There are no module-level path constants anywhere in the crate; every
/// file location, timeout, and delay bound the pipeline uses lives here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fresh input records (collaborator-produced JSON array).
    pub input_path: String,
    /// Verification-pass output; preferred on load when present (resume).
    pub output_path: String,
    /// Scrape-pass output; preferred over `output_path` by the scrape stage.
    pub final_output_path: String,
    /// Flush the full record list after this many processed units.
    pub save_batch_size: usize,

    /// HTTP request timeout for scrape fetches.
    pub request_timeout: Duration,
    /// User agent sent with scrape fetches.
    pub user_agent: String,
    /// Politeness delay bounds between page fetches, in seconds.
    pub page_delay: (f32, f32),

    /// DNS resolution timeout.
    pub dns_timeout: Duration,
    /// Explicit DNS servers; empty means system defaults.
    pub dns_servers: Vec<String>,

    /// Connection and per-command timeout for SMTP sessions.
    pub smtp_timeout: Duration,
    /// Port probed on the resolved mail exchanger.
    pub smtp_port: u16,
    /// MAIL FROM identity used during probe sessions.
    pub smtp_sender_email: String,
    /// Politeness delay bounds between RCPT probes on one session, in seconds.
    pub probe_delay: (f32, f32),

    /// Anchor/href keywords that mark a page worth scraping.
    pub scrape_link_keywords: Vec<String>,
    /// Conventional paths always tried, reachable origin or not.
    pub scrape_fallback_paths: Vec<String>,
    /// Upper bound on pages fetched per site.
    pub max_pages_per_site: usize,

    /// Validity window for harvest checkpoint files, in days.
    pub checkpoint_max_age_days: i64,

    /// Compiled email-token matcher.
    pub email_regex: Regex,
    /// Which config file (if any) the settings were loaded from.
    pub loaded_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: "input.json".to_string(),
            output_path: "enriched.json".to_string(),
            final_output_path: "final_enriched.json".to_string(),
            save_batch_size: 5,
            request_timeout: Duration::from_secs(10),
            user_agent: concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
                "(KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36"
            )
            .to_string(),
            page_delay: (0.5, 1.5),
            dns_timeout: Duration::from_secs(5),
            dns_servers: Vec::new(),
            smtp_timeout: Duration::from_secs(10),
            smtp_port: 25,
            smtp_sender_email: "test@example.com".to_string(),
            probe_delay: (0.1, 0.3),
            scrape_link_keywords: vec![
                "contact".to_string(),
                "about".to_string(),
                "team".to_string(),
            ],
            scrape_fallback_paths: vec![
                "/contact".to_string(),
                "/contact-us".to_string(),
                "/about".to_string(),
            ],
            max_pages_per_site: 12,
            checkpoint_max_age_days: 30,
            email_regex: Regex::new(EMAIL_PATTERN).expect("email pattern must compile"),
            loaded_config_path: None,
        }
    }
}

/// Draws a jittered delay from an inclusive `(min, max)` bound in seconds.
pub fn random_delay(bounds: (f32, f32)) -> Duration {
    let (min, max) = bounds;
    let secs = if max > min {
        rand::thread_rng().gen_range(min..=max)
    } else {
        min
    };
    Duration::from_secs_f32(secs.max(0.0))
}

/// TOML file schema. Every field is optional; absent fields keep their
/// defaults, and builder overrides win over file values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub files: FilesSection,
    pub network: NetworkSection,
    pub dns: DnsSection,
    pub smtp: SmtpSection,
    pub scraping: ScrapingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FilesSection {
    pub input: Option<String>,
    pub output: Option<String>,
    pub final_output: Option<String>,
    pub save_batch_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    pub request_timeout: Option<u64>,
    pub user_agent: Option<String>,
    pub min_page_delay: Option<f32>,
    pub max_page_delay: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DnsSection {
    pub dns_timeout: Option<u64>,
    pub dns_servers: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SmtpSection {
    pub smtp_timeout: Option<u64>,
    pub smtp_port: Option<u16>,
    pub sender_email: Option<String>,
    pub min_probe_delay: Option<f32>,
    pub max_probe_delay: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScrapingSection {
    pub link_keywords: Option<Vec<String>>,
    pub fallback_paths: Option<Vec<String>>,
    pub max_pages_per_site: Option<usize>,
    pub checkpoint_max_age_days: Option<i64>,
}
