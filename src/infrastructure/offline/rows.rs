use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingMutationRow {
    pub id: String,
    pub kind: String,
    pub payload: String,
    pub status: String,
    pub retry_count: i64,
    pub created_at: i64,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SiteVisitRow {
    pub id: String,
    pub site_entry_id: String,
    pub site_name: String,
    pub status: String,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub notes: Option<String>,
    pub enumerator_fee: i64,
    pub transport_fee: i64,
    pub is_synced: bool,
    pub synced_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocationSampleRow {
    pub id: String,
    pub user_id: String,
    pub lat: f64,
    pub lng: f64,
    pub accuracy: Option<f64>,
    pub recorded_at: i64,
    pub is_synced: bool,
}

/// Timestamps on cached responses are unix milliseconds; staleness is
/// reported to the millisecond.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CachedResponseRow {
    pub cache_key: String,
    pub tier: String,
    pub url: String,
    pub status: i64,
    pub headers: String,
    pub body: Vec<u8>,
    pub cached_at: i64,
    pub expires_at: i64,
}
