//! File-level flow: load, run both stages, resume from flushed output.

use email_enrich::{
    initialize_pipeline, load_records, ConfigBuilder, EmailStatus, ScrapeStatus,
};

use std::fs::File;
use std::io::Write;
use tempfile::tempdir;

// One fully-verified company and one annotated-from-a-prior-run company with
// no website: both stages finish without touching the network.
const INPUT: &str = r#"[
    {
        "company_name": "Acme",
        "website": "https://acme.com",
        "batch": "W24",
        "founder_details": [
            {"name": "Jane Doe", "verified_email": "jane@acme.com", "email_status": "verified"}
        ]
    },
    {
        "company_name": "Ghost Co",
        "website": null,
        "founder_details": [
            {"name": "John Roe", "verified_email": null, "email_status": "catch-all"}
        ],
        "scrape_status": "pending_generic_scrape"
    }
]"#;

#[tokio::test]
async fn test_both_stages_annotate_and_flush_resumable_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.json");
    let output = dir.path().join("enriched.json");
    let final_output = dir.path().join("final_enriched.json");
    File::create(&input)
        .unwrap()
        .write_all(INPUT.as_bytes())
        .unwrap();

    let config = std::sync::Arc::new(
        ConfigBuilder::new()
            .input_path(input.to_str().unwrap())
            .output_path(output.to_str().unwrap())
            .final_output_path(final_output.to_str().unwrap())
            .build()
            .unwrap(),
    );
    let pipeline = initialize_pipeline(config.clone()).unwrap();

    let mut records = load_records(&config.input_path, &config.output_path).unwrap();
    let summary = pipeline.run_verification_pass(&mut records).await;
    assert_eq!(summary.founders_probed, 0);
    assert_eq!(records[0].scrape_status, Some(ScrapeStatus::Complete));

    // The flushed output is now the resume point and reflects progress.
    let resumed = load_records(&config.input_path, &config.output_path).unwrap();
    assert_eq!(
        resumed[0].founder_details[0].email_status,
        Some(EmailStatus::Verified)
    );
    assert_eq!(resumed[0].extra.get("batch").unwrap(), "W24");

    let summary = pipeline.run_scrape_pass(&mut records).await;
    assert_eq!(summary.no_website, 1);
    assert_eq!(
        records[1].scrape_status,
        Some(ScrapeStatus::ScrapeFailedNoWebsite)
    );

    let finalized = load_records(&config.output_path, &config.final_output_path).unwrap();
    assert_eq!(
        finalized[1].scrape_status,
        Some(ScrapeStatus::ScrapeFailedNoWebsite)
    );
}

#[tokio::test]
async fn test_missing_input_file_is_a_hard_error() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("missing.json");
    let output = dir.path().join("enriched.json");
    assert!(load_records(input.to_str().unwrap(), output.to_str().unwrap()).is_err());
}
