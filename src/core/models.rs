//! Data model: company records, founder sub-records, and status enums.
//!
//! Records are the unit of durability. Both `CompanyRecord` and `Founder`
//! carry a flattened map of fields this pipeline does not interpret, so that
//! collaborator-produced data (bios, social links, extraction metadata)
//! survives a load/annotate/save cycle untouched.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Distinguishes an absent field from an explicit `null` on load, so that a
/// persisted `"verified_email": null` is not dropped on re-save.
fn double_option<'de, T, D>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// One organization, with the people attached to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyRecord {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub founder_details: Vec<Founder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_status: Option<ScrapeStatus>,
    /// Set by the fallback-scrape pass. `Some(None)` is meaningful: the scrape
    /// ran and found nothing.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub published_company_email: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// One person at a company. Never deleted, only annotated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Founder {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub verified_email: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_status: Option<EmailStatus>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Founder {
    /// A founder with a recorded status is never re-probed (idempotent resume).
    pub fn is_processed(&self) -> bool {
        self.email_status.is_some()
    }
}

/// Per-person verification status, as persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmailStatus {
    #[serde(rename = "verified")]
    Verified,
    #[serde(rename = "catch-all")]
    CatchAll,
    #[serde(rename = "not_found")]
    NotFound,
}

/// Per-company progress through the fallback-scrape stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    PendingGenericScrape,
    Complete,
    ScrapeComplete,
    ScrapeFailedNoEmail,
    ScrapeFailedNoWebsite,
}

/// Which side of the network failed during a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Dns,
    Smtp,
}

/// Outcome of one domain/person verification attempt. Internal; the
/// orchestrator translates it into an [`EmailStatus`] on the founder.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    /// The mail server accepted this candidate (and is not a catch-all).
    Verified(String),
    /// The server accepts any recipient; per-candidate acceptance is noise.
    CatchAll,
    /// No candidate was accepted.
    NotFound,
    /// DNS or SMTP failure; treated as not-found with the cause logged.
    Error(FailureKind),
}

impl VerificationOutcome {
    /// Collapses the outcome into the persisted status + email pair.
    pub fn into_status(self) -> (Option<String>, EmailStatus) {
        match self {
            VerificationOutcome::Verified(addr) => (Some(addr), EmailStatus::Verified),
            VerificationOutcome::CatchAll => (None, EmailStatus::CatchAll),
            VerificationOutcome::NotFound | VerificationOutcome::Error(_) => {
                (None, EmailStatus::NotFound)
            }
        }
    }
}
