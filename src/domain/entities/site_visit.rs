use crate::domain::value_objects::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Started,
    Completed,
}

impl VisitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Started => "started",
            VisitStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "started" => Ok(VisitStatus::Started),
            "completed" => Ok(VisitStatus::Completed),
            other => Err(format!("Unknown visit status: {other}")),
        }
    }
}

/// Locally authored snapshot of a site visit, reconciled against the remote
/// entry by the orchestrator. At most one unsynced record per
/// `site_entry_id` is authoritative; a synced record only ever gains a
/// `synced_at` stamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteVisitRecord {
    pub id: String,
    pub site_entry_id: String,
    pub site_name: String,
    pub status: VisitStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub start_location: Option<GeoPoint>,
    pub end_location: Option<GeoPoint>,
    pub notes: Option<String>,
    /// Fees in minor currency units.
    pub enumerator_fee: i64,
    pub transport_fee: i64,
    pub synced: bool,
    pub synced_at: Option<DateTime<Utc>>,
}

impl SiteVisitRecord {
    pub fn total_fee(&self) -> i64 {
        self.enumerator_fee + self.transport_fee
    }
}

#[derive(Debug, Clone)]
pub struct SiteVisitDraft {
    pub site_entry_id: String,
    pub site_name: String,
    pub status: VisitStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub start_location: Option<GeoPoint>,
    pub end_location: Option<GeoPoint>,
    pub notes: Option<String>,
    pub enumerator_fee: i64,
    pub transport_fee: i64,
}
