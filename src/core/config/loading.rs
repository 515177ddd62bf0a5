//! Loads configuration from TOML files and merges it onto a `Config`.

use super::{Config, ConfigFile};
use anyhow::Context;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Reads and parses a TOML configuration file.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;
    let parsed: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;
    tracing::debug!("Parsed configuration file: {}", file_path);
    Ok(parsed)
}

/// Merges a parsed `ConfigFile` onto a mutable `Config`. Only present fields
/// are applied, so the same merge works for file contents and for builder
/// overrides applied afterwards.
pub(crate) fn apply_file_config(config: &mut Config, file: &ConfigFile) {
    // Files
    if let Some(ref input) = file.files.input {
        config.input_path = input.clone();
    }
    if let Some(ref output) = file.files.output {
        config.output_path = output.clone();
    }
    if let Some(ref final_output) = file.files.final_output {
        config.final_output_path = final_output.clone();
    }
    if let Some(batch) = file.files.save_batch_size {
        config.save_batch_size = batch;
    }

    // Network
    if let Some(timeout) = file.network.request_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    if let Some(ref user_agent) = file.network.user_agent {
        config.user_agent = user_agent.clone();
    }
    if let Some(min) = file.network.min_page_delay {
        config.page_delay.0 = min;
    }
    if let Some(max) = file.network.max_page_delay {
        config.page_delay.1 = max;
    }

    // DNS
    if let Some(timeout) = file.dns.dns_timeout {
        config.dns_timeout = Duration::from_secs(timeout);
    }
    if let Some(ref servers) = file.dns.dns_servers {
        if !servers.is_empty() {
            config.dns_servers = servers.clone();
        }
    }

    // SMTP
    if let Some(timeout) = file.smtp.smtp_timeout {
        config.smtp_timeout = Duration::from_secs(timeout);
    }
    if let Some(port) = file.smtp.smtp_port {
        config.smtp_port = port;
    }
    if let Some(ref sender) = file.smtp.sender_email {
        config.smtp_sender_email = sender.clone();
    }
    if let Some(min) = file.smtp.min_probe_delay {
        config.probe_delay.0 = min;
    }
    if let Some(max) = file.smtp.max_probe_delay {
        config.probe_delay.1 = max;
    }

    // Scraping
    if let Some(ref keywords) = file.scraping.link_keywords {
        if !keywords.is_empty() {
            config.scrape_link_keywords = keywords.clone();
        }
    }
    if let Some(ref paths) = file.scraping.fallback_paths {
        if !paths.is_empty() {
            config.scrape_fallback_paths = paths.clone();
        }
    }
    if let Some(max_pages) = file.scraping.max_pages_per_site {
        config.max_pages_per_site = max_pages;
    }
    if let Some(age) = file.scraping.checkpoint_max_age_days {
        config.checkpoint_max_age_days = age;
    }
}
