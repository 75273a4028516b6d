use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a queued mutation. Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutationId(String);

impl MutationId {
    pub fn new(value: String) -> Result<Self, String> {
        if value.trim().is_empty() {
            return Err("Mutation id must not be empty".to_string());
        }
        Ok(Self(value))
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    VisitStart,
    VisitComplete,
    LocationUpdate,
    CostSubmission,
    PhotoUpload,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::VisitStart => "visit_start",
            MutationKind::VisitComplete => "visit_complete",
            MutationKind::LocationUpdate => "location_update",
            MutationKind::CostSubmission => "cost_submission",
            MutationKind::PhotoUpload => "photo_upload",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "visit_start" => Ok(MutationKind::VisitStart),
            "visit_complete" => Ok(MutationKind::VisitComplete),
            "location_update" => Ok(MutationKind::LocationUpdate),
            "cost_submission" => Ok(MutationKind::CostSubmission),
            "photo_upload" => Ok(MutationKind::PhotoUpload),
            other => Err(format!("Unknown mutation kind: {other}")),
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue item state. The only transitions are pending -> syncing -> failed,
/// plus the manual failed -> pending requeue; successful items are deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStatus {
    Pending,
    Syncing,
    Failed,
}

impl MutationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationStatus::Pending => "pending",
            MutationStatus::Syncing => "syncing",
            MutationStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "pending" => Ok(MutationStatus::Pending),
            "syncing" => Ok(MutationStatus::Syncing),
            "failed" => Ok(MutationStatus::Failed),
            other => Err(format!("Unknown mutation status: {other}")),
        }
    }
}
