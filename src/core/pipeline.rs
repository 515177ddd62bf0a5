//! Pipeline orchestrator and state machine.
//!
//! Drives a loaded record list through the verification stage and the
//! fallback-scrape stage, one unit at a time, with skip/resume logic per
//! record and per person. The orchestrator is the sole mutator of the record
//! list; everything it learns is written back in place so an interrupted run
//! picks up where the last flushed batch left off.

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::models::{
    CompanyRecord, EmailStatus, FailureKind, ScrapeStatus, VerificationOutcome,
};
use crate::core::store;
use crate::scrape::PublishedEmailScraper;
use crate::utils::dns::{create_resolver, resolve_mail_server};
use crate::utils::domain::extract_domain;
use crate::utils::patterns::generate_candidates;
use crate::utils::smtp::{SessionVerdict, SmtpProber};

use std::sync::Arc;
use trust_dns_resolver::TokioAsyncResolver;

/// Counters rolled up after the verification pass.
#[derive(Debug, Default, Clone)]
pub struct VerifySummary {
    pub companies_processed: usize,
    pub founders_probed: usize,
    pub founders_skipped: usize,
    pub verified: usize,
    pub catch_all: usize,
    pub not_found: usize,
    pub dns_errors: usize,
    pub smtp_errors: usize,
}

/// Counters rolled up after the fallback-scrape pass.
#[derive(Debug, Default, Clone)]
pub struct ScrapeSummary {
    pub companies_scraped: usize,
    pub emails_found: usize,
    pub no_email: usize,
    pub no_website: usize,
}

/// Orchestrates verification and fallback scraping over a record list.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    resolver: Arc<TokioAsyncResolver>,
    prober: SmtpProber,
    scraper: PublishedEmailScraper,
}

impl Pipeline {
    /// Initializes shared resources (DNS resolver, SMTP prober, HTTP scraper).
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let resolver = Arc::new(create_resolver(&config)?);
        let prober = SmtpProber::new(Arc::clone(&config));
        let scraper = PublishedEmailScraper::new(Arc::clone(&config))?;
        tracing::debug!("Pipeline components initialized.");
        Ok(Self {
            config,
            resolver,
            prober,
            scraper,
        })
    }

    /// Stage 1: SMTP-verifies every founder lacking a recorded status.
    ///
    /// Progress is flushed to the stage output after every
    /// `save_batch_size` processed companies and once more at the end,
    /// regardless of whether the final batch filled (or anything was
    /// processed at all).
    pub async fn run_verification_pass(
        &self,
        records: &mut Vec<CompanyRecord>,
    ) -> VerifySummary {
        let mut summary = VerifySummary::default();
        let output_path = self.config.output_path.clone();

        for index in 0..records.len() {
            let processed = self.verify_company(&mut records[index], &mut summary).await;
            if !processed {
                continue;
            }

            summary.companies_processed += 1;
            if summary.companies_processed % self.config.save_batch_size == 0 {
                tracing::info!("...saving progress to '{}'...", output_path);
                store::save_records_best_effort(records, &output_path);
            }
        }

        tracing::info!("Verification pass finished. Final save to '{}'.", output_path);
        store::save_records_best_effort(records, &output_path);
        summary
    }

    /// Processes one company's founders. Returns false when the record was
    /// skipped before any founder could be considered (missing/bad website).
    async fn verify_company(
        &self,
        company: &mut CompanyRecord,
        summary: &mut VerifySummary,
    ) -> bool {
        let company_name = company
            .company_name
            .clone()
            .unwrap_or_else(|| "Unknown Company".to_string());

        let website = match company.website.as_deref() {
            Some(w) if !w.trim().is_empty() => w.to_string(),
            _ => return false,
        };
        let domain = match extract_domain(&website) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Skipping {}: cannot extract domain: {}", company_name, e);
                return false;
            }
        };

        tracing::info!("--- Processing {} ({}) ---", company_name, domain);
        let mut needs_generic_scrape = false;

        for founder in &mut company.founder_details {
            // A founder we cannot even name stays unset, which keeps the
            // record out of the `complete` state.
            let full_name = match founder.name.clone() {
                Some(name) => name,
                None => {
                    needs_generic_scrape = true;
                    continue;
                }
            };

            // Skip-logic: an annotated founder is never re-probed, but still
            // contributes to whether the company needs the fallback scrape.
            if founder.is_processed() {
                tracing::info!("  - Skipping {} (already processed)", full_name);
                summary.founders_skipped += 1;
                if founder.email_status != Some(EmailStatus::Verified) {
                    needs_generic_scrape = true;
                }
                continue;
            }

            let parts: Vec<&str> = full_name.split_whitespace().collect();
            let first = match parts.first() {
                Some(p) => p.to_string(),
                None => continue,
            };
            let last = parts
                .last()
                .filter(|_| parts.len() > 1)
                .map(|p| p.to_string())
                .unwrap_or_else(|| first.clone());

            let candidates = generate_candidates(&first, &last, &domain);
            if candidates.is_empty() {
                tracing::info!("  - Skipping {} (name unusable after normalizing)", full_name);
                summary.founders_skipped += 1;
                needs_generic_scrape = true;
                continue;
            }

            tracing::info!("  - Verifying: {}...", full_name);
            summary.founders_probed += 1;
            let outcome = self.verify_candidates(&domain, &candidates).await;

            match &outcome {
                VerificationOutcome::Verified(addr) => {
                    tracing::info!("  - Result: verified -> {}", addr);
                    summary.verified += 1;
                }
                VerificationOutcome::CatchAll => {
                    tracing::info!("  - Result: catch-all");
                    summary.catch_all += 1;
                }
                VerificationOutcome::NotFound => {
                    tracing::info!("  - Result: not_found");
                    summary.not_found += 1;
                }
                VerificationOutcome::Error(FailureKind::Dns) => {
                    tracing::info!("  - Result: not_found (DNS failure)");
                    summary.not_found += 1;
                    summary.dns_errors += 1;
                }
                VerificationOutcome::Error(FailureKind::Smtp) => {
                    tracing::info!("  - Result: not_found (SMTP failure)");
                    summary.not_found += 1;
                    summary.smtp_errors += 1;
                }
            }

            let (email, status) = outcome.into_status();
            founder.verified_email = Some(email);
            founder.email_status = Some(status);
            if status != EmailStatus::Verified {
                needs_generic_scrape = true;
            }
        }

        // Any non-verified founder forces the fallback stage; otherwise the
        // record is complete unless an earlier run already decided.
        if needs_generic_scrape {
            company.scrape_status = Some(ScrapeStatus::PendingGenericScrape);
        } else if company.scrape_status.is_none() {
            company.scrape_status = Some(ScrapeStatus::Complete);
        }

        true
    }

    /// Runs one full domain verification: MX resolution, then the probe
    /// session. DNS and SMTP failures are terminal-but-non-fatal; the
    /// distinct cause is logged and the founder ends up `not_found`.
    async fn verify_candidates(
        &self,
        domain: &str,
        candidates: &[String],
    ) -> VerificationOutcome {
        let mail_server = match resolve_mail_server(&self.resolver, domain).await {
            Ok(ms) => ms,
            Err(e) => {
                tracing::warn!("  [Skipping domain {}: DNS error: {}]", domain, e);
                return VerificationOutcome::Error(FailureKind::Dns);
            }
        };

        match self
            .prober
            .probe_candidates(domain, &mail_server.exchange, candidates)
            .await
        {
            Ok(SessionVerdict::CatchAll) => VerificationOutcome::CatchAll,
            Ok(SessionVerdict::Accepted(address)) => VerificationOutcome::Verified(address),
            Ok(SessionVerdict::NoneAccepted) => VerificationOutcome::NotFound,
            Err(e) => {
                tracing::warn!("  [SMTP error for {}: {}]", domain, e);
                VerificationOutcome::Error(FailureKind::Smtp)
            }
        }
    }

    /// Stage 2: scrapes companies flagged `pending_generic_scrape` for a
    /// published contact address. Same batched-save discipline as stage 1.
    pub async fn run_scrape_pass(&self, records: &mut Vec<CompanyRecord>) -> ScrapeSummary {
        let mut summary = ScrapeSummary::default();
        let output_path = self.config.final_output_path.clone();

        for index in 0..records.len() {
            if records[index].scrape_status != Some(ScrapeStatus::PendingGenericScrape) {
                continue;
            }

            let company_name = records[index]
                .company_name
                .clone()
                .unwrap_or_else(|| "Unknown Company".to_string());
            let website = records[index].website.clone().filter(|w| !w.trim().is_empty());

            let website = match website {
                Some(w) => w,
                None => {
                    tracing::info!("Skipping {} (no website).", company_name);
                    records[index].scrape_status = Some(ScrapeStatus::ScrapeFailedNoWebsite);
                    summary.no_website += 1;
                    continue;
                }
            };

            tracing::info!("--- Scraping {} ({}) ---", company_name, website);
            match self.scraper.find_published_email(&website).await {
                Some(email) => {
                    records[index].published_company_email = Some(Some(email));
                    records[index].scrape_status = Some(ScrapeStatus::ScrapeComplete);
                    summary.emails_found += 1;
                }
                None => {
                    records[index].published_company_email = Some(None);
                    records[index].scrape_status = Some(ScrapeStatus::ScrapeFailedNoEmail);
                    summary.no_email += 1;
                }
            }

            summary.companies_scraped += 1;
            if summary.companies_scraped % self.config.save_batch_size == 0 {
                tracing::info!("...saving progress to '{}'...", output_path);
                store::save_records_best_effort(records, &output_path);
            }
        }

        tracing::info!("Scrape pass finished. Final save to '{}'.", output_path);
        store::save_records_best_effort(records, &output_path);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigBuilder;
    use crate::core::models::Founder;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn test_pipeline(dir: &TempDir) -> Pipeline {
        let config = ConfigBuilder::new()
            .input_path(dir.path().join("input.json").to_str().unwrap())
            .output_path(dir.path().join("output.json").to_str().unwrap())
            .final_output_path(dir.path().join("final.json").to_str().unwrap())
            .build()
            .unwrap();
        Pipeline::new(Arc::new(config)).unwrap()
    }

    fn founder(name: &str, status: Option<EmailStatus>) -> Founder {
        Founder {
            name: Some(name.to_string()),
            verified_email: status.map(|_| None),
            email_status: status,
            extra: HashMap::new(),
        }
    }

    fn company(
        name: &str,
        website: Option<&str>,
        founders: Vec<Founder>,
        scrape_status: Option<ScrapeStatus>,
    ) -> CompanyRecord {
        CompanyRecord {
            company_name: Some(name.to_string()),
            website: website.map(str::to_string),
            founder_details: founders,
            scrape_status,
            published_company_email: None,
            extra: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_processed_founders_are_never_reprobed() {
        let dir = TempDir::new().unwrap();
        let pipeline = test_pipeline(&dir);
        let mut records = vec![company(
            "Acme",
            Some("https://acme.com"),
            vec![
                founder("Jane Doe", Some(EmailStatus::Verified)),
                founder("John Roe", Some(EmailStatus::Verified)),
            ],
            None,
        )];

        // All founders annotated: the pass must finish without any network
        // probe and mark the record complete.
        let summary = pipeline.run_verification_pass(&mut records).await;
        assert_eq!(summary.founders_probed, 0);
        assert_eq!(summary.founders_skipped, 2);
        assert_eq!(records[0].scrape_status, Some(ScrapeStatus::Complete));
    }

    #[tokio::test]
    async fn test_non_verified_founder_forces_pending_scrape() {
        let dir = TempDir::new().unwrap();
        let pipeline = test_pipeline(&dir);
        let mut records = vec![company(
            "Acme",
            Some("https://acme.com"),
            vec![
                founder("Jane Doe", Some(EmailStatus::Verified)),
                founder("John Roe", Some(EmailStatus::CatchAll)),
            ],
            None,
        )];

        pipeline.run_verification_pass(&mut records).await;
        assert_eq!(
            records[0].scrape_status,
            Some(ScrapeStatus::PendingGenericScrape)
        );
    }

    #[tokio::test]
    async fn test_unusable_founder_name_blocks_completion() {
        let dir = TempDir::new().unwrap();
        let pipeline = test_pipeline(&dir);
        // The second founder's name normalizes to nothing, so no candidates
        // exist and no status is recorded; the record must not end complete.
        let mut records = vec![company(
            "Acme",
            Some("https://acme.com"),
            vec![
                founder("Jane Doe", Some(EmailStatus::Verified)),
                founder("李", None),
            ],
            None,
        )];

        let summary = pipeline.run_verification_pass(&mut records).await;
        assert_eq!(summary.founders_probed, 0);
        assert!(records[0].founder_details[1].email_status.is_none());
        assert_eq!(
            records[0].scrape_status,
            Some(ScrapeStatus::PendingGenericScrape)
        );
    }

    #[tokio::test]
    async fn test_company_without_website_skipped_in_verification() {
        let dir = TempDir::new().unwrap();
        let pipeline = test_pipeline(&dir);
        let mut records = vec![company(
            "No Site Inc",
            None,
            vec![founder("Jane Doe", None)],
            None,
        )];

        let summary = pipeline.run_verification_pass(&mut records).await;
        assert_eq!(summary.companies_processed, 0);
        assert!(records[0].founder_details[0].email_status.is_none());
        assert!(records[0].scrape_status.is_none());
    }

    #[tokio::test]
    async fn test_pending_record_without_website_fails_no_website() {
        let dir = TempDir::new().unwrap();
        let pipeline = test_pipeline(&dir);
        let mut records = vec![company(
            "Ghost Co",
            None,
            vec![founder("Jane Doe", Some(EmailStatus::NotFound))],
            Some(ScrapeStatus::PendingGenericScrape),
        )];

        let summary = pipeline.run_scrape_pass(&mut records).await;
        assert_eq!(summary.no_website, 1);
        assert_eq!(summary.companies_scraped, 0);
        assert_eq!(
            records[0].scrape_status,
            Some(ScrapeStatus::ScrapeFailedNoWebsite)
        );
        assert!(records[0].published_company_email.is_none());
    }

    #[tokio::test]
    async fn test_complete_records_never_reach_the_scraper() {
        let dir = TempDir::new().unwrap();
        let pipeline = test_pipeline(&dir);
        let mut records = vec![company(
            "Done Co",
            Some("https://done.example"),
            vec![founder("Jane Doe", Some(EmailStatus::Verified))],
            Some(ScrapeStatus::Complete),
        )];

        // A complete record is filtered before any fetch happens, so this
        // finishes instantly even though the website does not resolve.
        let summary = pipeline.run_scrape_pass(&mut records).await;
        assert_eq!(summary.companies_scraped, 0);
        assert_eq!(records[0].scrape_status, Some(ScrapeStatus::Complete));
    }

    #[tokio::test]
    async fn test_final_save_happens_even_with_zero_progress() {
        let dir = TempDir::new().unwrap();
        let pipeline = test_pipeline(&dir);
        let mut records: Vec<CompanyRecord> = Vec::new();

        pipeline.run_verification_pass(&mut records).await;
        assert!(dir.path().join("output.json").is_file());

        pipeline.run_scrape_pass(&mut records).await;
        assert!(dir.path().join("final.json").is_file());
    }
}
