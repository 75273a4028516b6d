use crate::domain::value_objects::GeoPoint;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitFees {
    pub enumerator_fee: i64,
    pub transport_fee: i64,
}

impl VisitFees {
    pub fn total(&self) -> i64 {
        self.enumerator_fee + self.transport_fee
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSubmission {
    pub user_id: String,
    pub site_visit_id: String,
    pub transport_cost: i64,
    pub other_costs: i64,
    pub notes: Option<String>,
}

/// A claimed site whose confirmation deadline has lapsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseCandidate {
    pub site_id: String,
    pub site_name: String,
    pub assigned_to: String,
    pub deadline: DateTime<Utc>,
}

/// The remote system of record. One method per replayable operation; the
/// orchestrator dispatches queued mutations onto these.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn start_visit(
        &self,
        site_entry_id: &str,
        started_at: DateTime<Utc>,
        location: Option<&GeoPoint>,
    ) -> Result<(), AppError>;

    async fn complete_visit(
        &self,
        site_entry_id: &str,
        completed_at: DateTime<Utc>,
        location: Option<&GeoPoint>,
        notes: Option<&str>,
    ) -> Result<(), AppError>;

    /// Current remote status of the entry, used for conflict dedup before
    /// replaying a local snapshot.
    async fn visit_remote_status(&self, site_entry_id: &str)
        -> Result<Option<String>, AppError>;

    async fn visit_fees(&self, site_entry_id: &str) -> Result<VisitFees, AppError>;

    async fn update_current_location(
        &self,
        user_id: &str,
        point: &GeoPoint,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    async fn submit_cost(&self, submission: &CostSubmission) -> Result<(), AppError>;

    async fn upload_photo(
        &self,
        site_entry_id: &str,
        file_name: &str,
        content: &[u8],
    ) -> Result<(), AppError>;

    /// Inserts the ledger transaction row and increments the wallet's
    /// running total in the same logical step — both or neither.
    async fn credit_wallet(
        &self,
        user_id: &str,
        amount: i64,
        reference_id: &str,
    ) -> Result<(), AppError>;

    async fn release_candidates(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReleaseCandidate>, AppError>;

    async fn release_claim(&self, site_id: &str) -> Result<(), AppError>;
}
