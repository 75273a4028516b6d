use crate::domain::entities::{
    CachedResponse, LocationDraft, LocationSample, MutationDraft, OfflineStats, PendingMutation,
    SiteVisitDraft, SiteVisitRecord,
};
use crate::domain::value_objects::{CacheKey, MutationId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Transactional persistence over the five offline tables. The store is the
/// only shared mutable resource in the subsystem; every write is atomic per
/// record and multi-record operations run in a single transaction.
#[async_trait]
pub trait OfflineStore: Send + Sync {
    // Mutation queue
    async fn enqueue_mutation(&self, draft: MutationDraft) -> Result<PendingMutation, AppError>;
    /// Queue items still owed to the remote (pending or failed), in
    /// insertion order. Items frozen at the retry ceiling are included;
    /// the orchestrator skips them.
    async fn due_mutations(&self) -> Result<Vec<PendingMutation>, AppError>;
    async fn failed_mutations(&self) -> Result<Vec<PendingMutation>, AppError>;
    async fn get_mutation(&self, id: &MutationId) -> Result<Option<PendingMutation>, AppError>;
    async fn mark_mutation_syncing(&self, id: &MutationId) -> Result<(), AppError>;
    /// Records the error and increments the retry count.
    async fn mark_mutation_failed(&self, id: &MutationId, error: &str) -> Result<(), AppError>;
    async fn remove_mutation(&self, id: &MutationId) -> Result<(), AppError>;
    /// Manual operator action: every failed item back to pending with a
    /// fresh retry budget, in one transaction.
    async fn requeue_failed_mutations(&self) -> Result<u32, AppError>;

    // Site visits
    async fn save_site_visit(&self, draft: SiteVisitDraft) -> Result<SiteVisitRecord, AppError>;
    async fn unsynced_site_visits(&self) -> Result<Vec<SiteVisitRecord>, AppError>;
    async fn site_visit_for_entry(
        &self,
        site_entry_id: &str,
    ) -> Result<Option<SiteVisitRecord>, AppError>;
    async fn mark_site_visit_synced(
        &self,
        id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    // Location samples
    async fn save_location_sample(&self, draft: LocationDraft) -> Result<LocationSample, AppError>;
    async fn unsynced_locations(&self, user_id: &str) -> Result<Vec<LocationSample>, AppError>;
    /// Marks the whole batch in one transaction so a crash mid-batch leaves
    /// no sample half-synced.
    async fn mark_locations_synced(&self, ids: &[String]) -> Result<(), AppError>;

    // Cached responses
    async fn put_cached_response(&self, entry: &CachedResponse) -> Result<(), AppError>;
    /// Evicts an expired entry before reporting a miss.
    async fn get_cached_response(&self, key: &CacheKey)
        -> Result<Option<CachedResponse>, AppError>;
    async fn invalidate_response(&self, key: &CacheKey) -> Result<(), AppError>;
    async fn invalidate_url_prefix(&self, prefix: &str) -> Result<u64, AppError>;
    async fn evict_cached_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;

    // Application state
    async fn set_app_state(&self, key: &str, value: Value) -> Result<(), AppError>;
    async fn get_app_state(&self, key: &str) -> Result<Option<Value>, AppError>;

    async fn stats(&self) -> Result<OfflineStats, AppError>;
    /// Explicit operator action only; offline data is never cleared
    /// automatically.
    async fn clear_all(&self) -> Result<(), AppError>;
}
