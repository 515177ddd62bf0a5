//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile};
use crate::core::error::{AppError, Result};
use std::path::Path;
use std::time::Duration;

/// Builder pattern for creating `Config` instances.
///
/// Handles loading from a TOML file, applying overrides on top, and
/// validating the merged result.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    overrides: ConfigFile,
}

impl ConfigBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    pub fn input_path(mut self, path: impl Into<String>) -> Self {
        self.overrides.files.input = Some(path.into());
        self
    }
    pub fn output_path(mut self, path: impl Into<String>) -> Self {
        self.overrides.files.output = Some(path.into());
        self
    }
    pub fn final_output_path(mut self, path: impl Into<String>) -> Self {
        self.overrides.files.final_output = Some(path.into());
        self
    }
    pub fn save_batch_size(mut self, value: usize) -> Self {
        self.overrides.files.save_batch_size = Some(value);
        self
    }
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.overrides.network.request_timeout = Some(duration.as_secs());
        self
    }
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.overrides.network.user_agent = Some(value.into());
        self
    }
    pub fn page_delay(mut self, min: f32, max: f32) -> Self {
        self.overrides.network.min_page_delay = Some(min);
        self.overrides.network.max_page_delay = Some(max);
        self
    }
    pub fn dns_timeout(mut self, duration: Duration) -> Self {
        self.overrides.dns.dns_timeout = Some(duration.as_secs());
        self
    }
    pub fn dns_servers(mut self, servers: Vec<String>) -> Self {
        self.overrides.dns.dns_servers = Some(servers);
        self
    }
    pub fn smtp_timeout(mut self, duration: Duration) -> Self {
        self.overrides.smtp.smtp_timeout = Some(duration.as_secs());
        self
    }
    pub fn smtp_port(mut self, port: u16) -> Self {
        self.overrides.smtp.smtp_port = Some(port);
        self
    }
    pub fn smtp_sender_email(mut self, value: impl Into<String>) -> Self {
        self.overrides.smtp.sender_email = Some(value.into());
        self
    }
    pub fn probe_delay(mut self, min: f32, max: f32) -> Self {
        self.overrides.smtp.min_probe_delay = Some(min);
        self.overrides.smtp.max_probe_delay = Some(max);
        self
    }
    pub fn scrape_link_keywords(mut self, keywords: Vec<String>) -> Self {
        self.overrides.scraping.link_keywords = Some(keywords);
        self
    }
    pub fn scrape_fallback_paths(mut self, paths: Vec<String>) -> Self {
        self.overrides.scraping.fallback_paths = Some(paths);
        self
    }
    pub fn max_pages_per_site(mut self, value: usize) -> Self {
        self.overrides.scraping.max_pages_per_site = Some(value);
        self
    }
    pub fn checkpoint_max_age_days(mut self, value: i64) -> Self {
        self.overrides.scraping.checkpoint_max_age_days = Some(value);
        self
    }

    /// Builds the final `Config`, applying defaults, file settings, overrides,
    /// and validation in that order.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config);
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {}",
                        path, e
                    )));
                }
            }
        } else {
            for path_str in ["./email-enrich.toml", "./config.toml"] {
                if Path::new(path_str).exists() {
                    match load_config_file(path_str) {
                        Ok(file_config) => {
                            apply_file_config(&mut self.config, &file_config);
                            loaded_path = Some(path_str.to_string());
                            tracing::info!(
                                "Loaded base configuration from default location: {}",
                                path_str
                            );
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Failed to load or parse default config '{}': {}",
                                path_str,
                                e
                            );
                        }
                    }
                }
            }
            if loaded_path.is_none() {
                tracing::debug!("No configuration file found. Using defaults and overrides.");
            }
        }

        apply_file_config(&mut self.config, &self.overrides);
        self.config.loaded_config_path = loaded_path;
        validate_config(&mut self.config)?;

        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.save_batch_size, 5);
        assert_eq!(config.smtp_port, 25);
        assert_eq!(config.smtp_sender_email, "test@example.com");
        assert_eq!(config.scrape_fallback_paths.len(), 3);
        assert!(config.email_regex.is_match("info@acme.com"));
    }

    #[test]
    fn test_overrides_win() {
        let config = ConfigBuilder::new()
            .input_path("records.json")
            .save_batch_size(10)
            .smtp_port(2525)
            .probe_delay(0.0, 0.0)
            .build()
            .unwrap();
        assert_eq!(config.input_path, "records.json");
        assert_eq!(config.save_batch_size, 10);
        assert_eq!(config.smtp_port, 2525);
        assert_eq!(config.probe_delay, (0.0, 0.0));
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let result = ConfigBuilder::new().smtp_sender_email("not-an-email").build();
        assert!(result.is_err());
    }
}
