//! # Email Enrich Core Library
//!
//! This crate provides the core logic for enriching company/founder records
//! with verified email addresses: deterministic candidate generation, live
//! SMTP verification with catch-all detection, and a web-scraping fallback
//! for companies where verification stays inconclusive.
//!
//! It is designed to be used either directly as a library or via the
//! `email-enrich` command-line tool (which uses this library).

mod core;
mod scrape;
mod utils;

pub use crate::core::checkpoint::{load_checkpoint, save_checkpoint, HarvestCheckpoint};
pub use crate::core::config::{Config, ConfigBuilder, ConfigFile};
pub use crate::core::error::{AppError, Result};
pub use crate::core::models::{
    CompanyRecord, EmailStatus, Founder, ScrapeStatus, VerificationOutcome,
};
pub use crate::core::pipeline::{Pipeline, ScrapeSummary, VerifySummary};
pub use crate::core::store::{load_records, save_records};
pub use crate::scrape::PublishedEmailScraper;
pub use crate::utils::patterns::generate_candidates;
pub use crate::utils::smtp::{SessionVerdict, SmtpProber};

use std::sync::Arc;

/// Initializes shared resources (DNS resolver, SMTP prober, HTTP scraper).
/// Essential for creating a `Pipeline` instance.
pub fn initialize_pipeline(config: Arc<Config>) -> Result<Pipeline> {
    Pipeline::new(config)
}
