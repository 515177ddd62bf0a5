//! Harvest checkpoint files.
//!
//! The upstream link-harvesting collaborator snapshots its expensive URL
//! enumeration into a checkpoint with a fixed validity window. This module
//! implements that file's contract so collaborators on either side agree on
//! it: an expired, missing, or unparsable checkpoint is simply absent. Not
//! part of the verification state machine.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Accepts both RFC3339 and the collaborator's offset-less ISO form
/// (`datetime.now().isoformat()` carries no UTC offset). Offset-less stamps
/// are taken as UTC.
fn flexible_timestamp<'de, D>(de: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(de)?;
    if let Ok(stamped) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(stamped.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(serde::de::Error::custom)
}

/// Durable snapshot of a harvested URL list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestCheckpoint {
    #[serde(deserialize_with = "flexible_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub urls: Vec<String>,
    pub count: usize,
    pub unique_count: usize,
}

impl HarvestCheckpoint {
    /// Builds a checkpoint for a URL list, stamped now.
    pub fn new(urls: Vec<String>) -> Self {
        let unique_count = urls
            .iter()
            .collect::<std::collections::HashSet<_>>()
            .len();
        Self {
            timestamp: Utc::now(),
            count: urls.len(),
            unique_count,
            urls,
        }
    }

    fn is_fresh(&self, max_age_days: i64) -> bool {
        Utc::now() - self.timestamp < Duration::days(max_age_days)
    }
}

/// Loads a checkpoint if it exists, parses, and is within the validity
/// window. Anything else is treated as absent.
pub fn load_checkpoint(path: &str, max_age_days: i64) -> Option<HarvestCheckpoint> {
    if !Path::new(path).is_file() {
        tracing::debug!("No checkpoint file at '{}'", path);
        return None;
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Failed to open checkpoint '{}': {}", path, e);
            return None;
        }
    };
    let checkpoint: HarvestCheckpoint = match serde_json::from_reader(BufReader::new(file)) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to parse checkpoint '{}': {}", path, e);
            return None;
        }
    };

    if checkpoint.is_fresh(max_age_days) {
        tracing::info!(
            "Using checkpoint from {} ({} URLs)",
            checkpoint.timestamp,
            checkpoint.count
        );
        Some(checkpoint)
    } else {
        tracing::info!(
            "Checkpoint from {} has expired (window: {} days)",
            checkpoint.timestamp,
            max_age_days
        );
        None
    }
}

/// Writes a checkpoint. Best-effort, like the record store.
pub fn save_checkpoint(checkpoint: &HarvestCheckpoint, path: &str) {
    let result = File::create(path)
        .map_err(|e| e.to_string())
        .and_then(|f| {
            serde_json::to_writer_pretty(BufWriter::new(f), checkpoint)
                .map_err(|e| e.to_string())
        });
    match result {
        Ok(()) => tracing::info!("Saved checkpoint with {} URLs to '{}'", checkpoint.count, path),
        Err(e) => tracing::error!("CRITICAL: failed to write checkpoint '{}': {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_fresh_checkpoint_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        let path = path.to_str().unwrap();

        let checkpoint = HarvestCheckpoint::new(vec![
            "https://a.example/1".to_string(),
            "https://a.example/1".to_string(),
            "https://a.example/2".to_string(),
        ]);
        assert_eq!(checkpoint.count, 3);
        assert_eq!(checkpoint.unique_count, 2);

        save_checkpoint(&checkpoint, path);
        let loaded = load_checkpoint(path, 30).unwrap();
        assert_eq!(loaded.urls, checkpoint.urls);
    }

    #[test]
    fn test_expired_checkpoint_treated_as_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        let mut checkpoint = HarvestCheckpoint::new(vec!["https://a.example/1".to_string()]);
        checkpoint.timestamp = Utc::now() - Duration::days(31);
        save_checkpoint(&checkpoint, path.to_str().unwrap());

        assert!(load_checkpoint(path.to_str().unwrap(), 30).is_none());
    }

    #[test]
    fn test_unparsable_checkpoint_treated_as_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"{ nope").unwrap();

        assert!(load_checkpoint(path.to_str().unwrap(), 30).is_none());
    }

    #[test]
    fn test_missing_checkpoint_is_absent() {
        assert!(load_checkpoint("/nonexistent/checkpoint.json", 30).is_none());
    }

    #[test]
    fn test_offsetless_timestamp_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        // The collaborator stamps with datetime.now().isoformat(): microsecond
        // precision, no UTC offset.
        let stamp = (Utc::now() - Duration::days(1)).format("%Y-%m-%dT%H:%M:%S%.6f");
        let content = format!(
            r#"{{"timestamp": "{}", "urls": ["https://a.example/1"], "count": 1, "unique_count": 1}}"#,
            stamp
        );
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();

        let loaded = load_checkpoint(path.to_str().unwrap(), 30).unwrap();
        assert_eq!(loaded.count, 1);
        assert_eq!(loaded.urls, vec!["https://a.example/1".to_string()]);
    }

    #[test]
    fn test_offsetless_timestamp_still_expires() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        let stamp = (Utc::now() - Duration::days(45)).format("%Y-%m-%dT%H:%M:%S%.6f");
        let content = format!(
            r#"{{"timestamp": "{}", "urls": [], "count": 0, "unique_count": 0}}"#,
            stamp
        );
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();

        assert!(load_checkpoint(path.to_str().unwrap(), 30).is_none());
    }
}
