use crate::domain::value_objects::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An append-only GPS fix. Reconciliation transmits only the newest unsynced
/// sample per user; older fixes are marked synced alongside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationSample {
    pub id: String,
    pub user_id: String,
    pub point: GeoPoint,
    pub recorded_at: DateTime<Utc>,
    pub synced: bool,
}

#[derive(Debug, Clone)]
pub struct LocationDraft {
    pub user_id: String,
    pub point: GeoPoint,
    pub recorded_at: DateTime<Utc>,
}
