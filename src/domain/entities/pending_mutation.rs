use crate::domain::value_objects::{GeoPoint, MutationId, MutationKind, MutationStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A durably queued, replayable intent to change remote state. Removal is
/// the only "done" signal; there is no completed status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingMutation {
    pub id: MutationId,
    pub kind: MutationKind,
    pub payload: Value,
    pub status: MutationStatus,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub error_message: Option<String>,
}

impl PendingMutation {
    pub fn at_retry_ceiling(&self, max_retries: u32) -> bool {
        self.retry_count >= max_retries
    }
}

#[derive(Debug, Clone)]
pub struct MutationDraft {
    pub kind: MutationKind,
    pub payload: Value,
}

impl MutationDraft {
    pub fn new(kind: MutationKind, payload: Value) -> Self {
        Self { kind, payload }
    }
}

/// Payload carried by a `visit_start` mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitStartPayload {
    pub site_entry_id: String,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

/// Payload carried by a `visit_complete` mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitCompletePayload {
    pub site_entry_id: String,
    pub user_id: String,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationUpdatePayload {
    pub user_id: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSubmissionPayload {
    pub user_id: String,
    pub site_visit_id: String,
    pub transport_cost: i64,
    pub other_costs: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Photo bytes travel base64-encoded inside the queue payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoUploadPayload {
    pub site_entry_id: String,
    pub file_name: String,
    pub content_base64: String,
}
