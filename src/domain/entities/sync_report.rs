use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    Preparing,
    SiteVisits,
    Locations,
    MutationQueue,
    Complete,
}

/// Live snapshot of a drain pass, safe to hand to any subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncProgress {
    pub total: u32,
    pub completed: u32,
    pub failed: u32,
    pub current: Option<String>,
    pub running: bool,
    pub phase: SyncPhase,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl Default for SyncProgress {
    fn default() -> Self {
        Self {
            total: 0,
            completed: 0,
            failed: 0,
            current: None,
            running: false,
            phase: SyncPhase::Idle,
            last_sync_at: None,
        }
    }
}

/// Final accounting of one drain pass. Every error collected along the way
/// lands here; nothing is discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub synced: u32,
    pub failed: u32,
    pub errors: Vec<String>,
    pub duration_ms: i64,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Aggregate counts over the offline store, for observability surfaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfflineStats {
    pub pending_mutations: u64,
    pub failed_mutations: u64,
    pub unsynced_visits: u64,
    pub unsynced_locations: u64,
    pub cached_responses: u64,
}

impl OfflineStats {
    pub fn total_unsynced(&self) -> u64 {
        self.pending_mutations + self.failed_mutations + self.unsynced_visits + self.unsynced_locations
    }
}

/// Outcome of one auto-release sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoReleaseReport {
    pub processed: u32,
    pub released: u32,
    pub errors: u32,
}
