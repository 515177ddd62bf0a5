//! Durable storage for the record list: resume-aware loading and best-effort
//! batched saving.
//!
//! The record list is the unit of durability. Loading prefers prior partial
//! output so an interrupted run resumes instead of restarting; saving writes
//! the full list, so any flushed batch is a complete, valid snapshot.

use crate::core::error::{AppError, Result};
use crate::core::models::CompanyRecord;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Loads records, preferring `resume_path` when it exists and parses.
///
/// A corrupt resume file is a logged warning, not a crash: the run falls back
/// to `input_path` and re-derives progress from the statuses already recorded
/// in it (there are none, so it starts fresh). A missing `input_path` is the
/// one hard failure in the pipeline.
pub fn load_records(input_path: &str, resume_path: &str) -> Result<Vec<CompanyRecord>> {
    if Path::new(resume_path).is_file() {
        match read_records(resume_path) {
            Ok(records) => {
                tracing::info!(
                    "Resuming from '{}' ({} records)",
                    resume_path,
                    records.len()
                );
                return Ok(records);
            }
            Err(e) => {
                tracing::warn!(
                    "Output file '{}' is corrupt ({}). Starting fresh from '{}'.",
                    resume_path,
                    e,
                    input_path
                );
            }
        }
    }

    if !Path::new(input_path).is_file() {
        return Err(AppError::Config(format!(
            "Input file not found: {}",
            input_path
        )));
    }
    let records = read_records(input_path)?;
    tracing::info!(
        "Starting new run from '{}' ({} records)",
        input_path,
        records.len()
    );
    Ok(records)
}

fn read_records(path: &str) -> Result<Vec<CompanyRecord>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let records: Vec<CompanyRecord> = serde_json::from_reader(reader)?;
    Ok(records)
}

/// Writes the full record list as pretty-printed JSON.
///
/// Callers treat a failure here as critical-but-non-fatal: the data loss
/// window is bounded by the save batch size and the next run re-derives
/// progress from whatever snapshot did land.
pub fn save_records(records: &[CompanyRecord], path: &str) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, records)?;
    tracing::debug!("Saved {} records to '{}'", records.len(), path);
    Ok(())
}

/// Logs a save failure as critical and keeps going.
pub fn save_records_best_effort(records: &[CompanyRecord], path: &str) {
    if let Err(e) = save_records(records, path) {
        tracing::error!("CRITICAL: failed to write progress to '{}': {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(path: &std::path::Path, content: &str) {
        let mut f = File::create(path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    const INPUT: &str = r#"[{"company_name":"Acme","website":"https://acme.com","founder_details":[{"name":"Jane Doe"}]}]"#;

    #[test]
    fn test_load_prefers_existing_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.json");
        let output = dir.path().join("output.json");
        write_file(&input, INPUT);
        write_file(
            &output,
            r#"[{"company_name":"Resumed","founder_details":[]}]"#,
        );

        let records =
            load_records(input.to_str().unwrap(), output.to_str().unwrap()).unwrap();
        assert_eq!(records[0].company_name.as_deref(), Some("Resumed"));
    }

    #[test]
    fn test_corrupt_output_falls_back_to_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.json");
        let output = dir.path().join("output.json");
        write_file(&input, INPUT);
        write_file(&output, "{ not json");

        let records =
            load_records(input.to_str().unwrap(), output.to_str().unwrap()).unwrap();
        assert_eq!(records[0].company_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("missing.json");
        let output = dir.path().join("also-missing.json");
        assert!(load_records(input.to_str().unwrap(), output.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_save_load_round_trip_preserves_structure() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.json");
        let output = dir.path().join("output.json");
        write_file(
            &input,
            r#"[{"company_name":"Acme","website":null,"batch":"W24","founder_details":[{"name":"Jane","bio":"x","verified_email":null,"email_status":"not_found"}],"scrape_status":"pending_generic_scrape"}]"#,
        );

        let records = load_records(input.to_str().unwrap(), output.to_str().unwrap()).unwrap();
        save_records(&records, output.to_str().unwrap()).unwrap();
        let reloaded = load_records(input.to_str().unwrap(), output.to_str().unwrap()).unwrap();
        assert_eq!(records, reloaded);

        let original: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&input).unwrap()).unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(original, saved);
    }
}
