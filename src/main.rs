//! # Email Enrich CLI
//!
//! Command-line interface for the Email Enrich library (`email_enrich`).
//! This binary parses arguments, sets up configuration, initializes the
//! pipeline, runs the requested stage(s) over the record file, and reports a
//! rolled-up summary.

use email_enrich::{
    initialize_pipeline, load_records, Config, ConfigBuilder, ScrapeSummary, VerifySummary,
};

// Dependencies specific to the CLI binary
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

/// Which stage(s) of the enrichment pipeline to run.
#[derive(Copy, Clone, Debug, ValueEnum)]
enum Stage {
    /// SMTP verification of founder emails only.
    Verify,
    /// Fallback web scrape of pending companies only.
    Scrape,
    /// Verification followed by the fallback scrape.
    All,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Verify => write!(f, "verify"),
            Stage::Scrape => write!(f, "scrape"),
            Stage::All => write!(f, "all"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Enriches company records with verified founder emails.",
    long_about = "Email Enrich generates candidate email patterns per founder, verifies them \
                  against the company's mail server over SMTP (with catch-all detection), and \
                  falls back to scraping the company website for a published address when \
                  verification stays inconclusive."
)]
struct AppArgs {
    /// Path to the input JSON file containing company records.
    #[arg(short, long, default_value = "input.json", env = "EMAIL_ENRICH_INPUT")]
    input: String,

    /// Path to the verification-stage output file (also the resume point).
    #[arg(
        short,
        long,
        default_value = "enriched.json",
        env = "EMAIL_ENRICH_OUTPUT"
    )]
    output: String,

    /// Path to the scrape-stage output file (also its resume point).
    #[arg(
        long,
        default_value = "final_enriched.json",
        env = "EMAIL_ENRICH_FINAL_OUTPUT"
    )]
    final_output: String,

    /// Pipeline stage(s) to run.
    #[arg(short, long, value_enum, default_value_t = Stage::All)]
    stage: Stage,

    /// Path to a configuration file (TOML format) to load settings from. CLI args override file settings.
    #[arg(long, env = "EMAIL_ENRICH_CONFIG")]
    config_file: Option<String>,

    /// Number of processed records between progress saves.
    #[arg(long, env = "EMAIL_ENRICH_SAVE_BATCH_SIZE")]
    save_batch_size: Option<usize>,

    /// Sender email address for SMTP verification checks.
    #[arg(long, env = "EMAIL_ENRICH_SMTP_SENDER")]
    smtp_sender: Option<String>,

    /// User agent string for HTTP scraping requests.
    #[arg(long, env = "EMAIL_ENRICH_USER_AGENT")]
    user_agent: Option<String>,

    /// SMTP connection/command timeout in seconds.
    #[arg(long, env = "EMAIL_ENRICH_SMTP_TIMEOUT")]
    smtp_timeout: Option<u64>,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "EMAIL_ENRICH_REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// DNS resolution timeout in seconds.
    #[arg(long, env = "EMAIL_ENRICH_DNS_TIMEOUT")]
    dns_timeout: Option<u64>,

    /// Comma-separated list of DNS servers to use for MX lookups.
    #[arg(long, value_delimiter = ',', env = "EMAIL_ENRICH_DNS_SERVERS")]
    dns_servers: Option<Vec<String>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Setting up tracing subscriber failed")?;

    tracing::info!(
        "Email Enrich CLI v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let args = AppArgs::parse();
    tracing::debug!("Parsed CLI arguments: {:?}", args);

    let config = build_config(&args)?;
    tracing::debug!("Effective configuration loaded: {:?}", *config);

    let pipeline = match initialize_pipeline(config.clone()) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Initialization error: {}", e);
            return Err(anyhow::anyhow!("Failed to initialize pipeline: {}", e));
        }
    };

    let start_time = Instant::now();

    if matches!(args.stage, Stage::Verify | Stage::All) {
        let mut records = load_records(&config.input_path, &config.output_path)
            .map_err(|e| anyhow::anyhow!("Cannot load records: {}", e))?;

        let progress = stage_spinner(format!("Verifying {} records...", records.len()));
        let summary = pipeline.run_verification_pass(&mut records).await;
        progress.finish_and_clear();
        log_verify_summary(&summary);

        if matches!(args.stage, Stage::All) {
            // Stay on the in-memory list; stage 1 already flushed it to the
            // output path, so a crash here resumes cleanly.
            let progress = stage_spinner("Scraping pending records...".to_string());
            let summary = pipeline.run_scrape_pass(&mut records).await;
            progress.finish_and_clear();
            log_scrape_summary(&summary, &config);
        }
    } else {
        let mut records = load_records(&config.output_path, &config.final_output_path)
            .map_err(|e| anyhow::anyhow!("Cannot load records: {}", e))?;

        let progress = stage_spinner("Scraping pending records...".to_string());
        let summary = pipeline.run_scrape_pass(&mut records).await;
        progress.finish_and_clear();
        log_scrape_summary(&summary, &config);
    }

    tracing::info!(
        "Processing finished successfully. Total duration: {:.2?}",
        start_time.elapsed()
    );
    Ok(())
}

/// Builds the effective configuration: file settings first, CLI overrides on
/// top.
fn build_config(args: &AppArgs) -> Result<Arc<Config>> {
    let mut config_builder = ConfigBuilder::new()
        .input_path(&args.input)
        .output_path(&args.output)
        .final_output_path(&args.final_output);

    if let Some(ref path) = args.config_file {
        config_builder = config_builder.config_file(path);
    }
    if let Some(n) = args.save_batch_size {
        config_builder = config_builder.save_batch_size(n);
    }
    if let Some(ref s) = args.smtp_sender {
        config_builder = config_builder.smtp_sender_email(s);
    }
    if let Some(ref ua) = args.user_agent {
        config_builder = config_builder.user_agent(ua);
    }
    if let Some(t) = args.smtp_timeout {
        config_builder = config_builder.smtp_timeout(Duration::from_secs(t));
    }
    if let Some(t) = args.request_timeout {
        config_builder = config_builder.request_timeout(Duration::from_secs(t));
    }
    if let Some(t) = args.dns_timeout {
        config_builder = config_builder.dns_timeout(Duration::from_secs(t));
    }
    if let Some(ref servers) = args.dns_servers {
        if !servers.is_empty() {
            config_builder = config_builder.dns_servers(servers.clone());
        }
    }

    match config_builder.build() {
        Ok(cfg) => Ok(Arc::new(cfg)),
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            Err(anyhow::anyhow!("Failed to build configuration: {}", e))
        }
    }
}

fn stage_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed_precise}]")
            .expect("static template"),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn log_verify_summary(summary: &VerifySummary) {
    tracing::info!("--- Verification Summary ---");
    tracing::info!("Companies processed:   {}", summary.companies_processed);
    tracing::info!("Founders probed:       {}", summary.founders_probed);
    tracing::info!("Founders skipped:      {}", summary.founders_skipped);
    tracing::info!("  Verified:            {}", summary.verified);
    tracing::info!("  Catch-all:           {}", summary.catch_all);
    tracing::info!("  Not found:           {}", summary.not_found);
    if summary.dns_errors > 0 || summary.smtp_errors > 0 {
        tracing::info!(
            "  (of which errors:    {} DNS, {} SMTP)",
            summary.dns_errors,
            summary.smtp_errors
        );
    }
}

fn log_scrape_summary(summary: &ScrapeSummary, config: &Config) {
    tracing::info!("--- Scrape Summary ---");
    tracing::info!("Companies scraped:     {}", summary.companies_scraped);
    tracing::info!("  Emails found:        {}", summary.emails_found);
    tracing::info!("  No email on site:    {}", summary.no_email);
    tracing::info!("  No website:          {}", summary.no_website);
    tracing::info!("Final output: '{}'", config.final_output_path);
}
