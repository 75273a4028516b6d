use crate::application::ports::OfflineStore;
use crate::domain::entities::{
    LocationDraft, LocationSample, MutationDraft, OfflineStats, PendingMutation, SiteVisitDraft,
    SiteVisitRecord,
};
use crate::domain::value_objects::mutation::MutationKind;
use crate::shared::error::AppError;
use serde_json::Value;
use std::sync::Arc;

/// UI-facing write API over the offline store. Anything a screen cannot
/// complete synchronously lands here the instant it happens.
pub struct OfflineService {
    store: Arc<dyn OfflineStore>,
}

impl OfflineService {
    pub fn new(store: Arc<dyn OfflineStore>) -> Self {
        Self { store }
    }

    /// Durably queue an intent for later delivery. The returned mutation
    /// means *accepted*: callers must not re-prompt the user to repeat the
    /// action.
    pub async fn accept_mutation(
        &self,
        kind: MutationKind,
        payload: Value,
    ) -> Result<PendingMutation, AppError> {
        let mutation = self
            .store
            .enqueue_mutation(MutationDraft::new(kind, payload))
            .await?;
        tracing::info!(target: "fieldsync::offline", kind = %mutation.kind, id = %mutation.id, "mutation accepted for later delivery");
        Ok(mutation)
    }

    pub async fn record_site_visit(
        &self,
        draft: SiteVisitDraft,
    ) -> Result<SiteVisitRecord, AppError> {
        self.store.save_site_visit(draft).await
    }

    pub async fn record_location(&self, draft: LocationDraft) -> Result<LocationSample, AppError> {
        self.store.save_location_sample(draft).await
    }

    pub async fn site_visit_for_entry(
        &self,
        site_entry_id: &str,
    ) -> Result<Option<SiteVisitRecord>, AppError> {
        self.store.site_visit_for_entry(site_entry_id).await
    }

    pub async fn set_flag(&self, key: &str, value: Value) -> Result<(), AppError> {
        self.store.set_app_state(key, value).await
    }

    pub async fn flag(&self, key: &str) -> Result<Option<Value>, AppError> {
        self.store.get_app_state(key).await
    }

    pub async fn stats(&self) -> Result<OfflineStats, AppError> {
        self.store.stats().await
    }

    pub async fn failed_mutations(&self) -> Result<Vec<PendingMutation>, AppError> {
        self.store.failed_mutations().await
    }

    /// Operator action: give every frozen mutation a fresh retry budget.
    pub async fn requeue_failed(&self) -> Result<u32, AppError> {
        let requeued = self.store.requeue_failed_mutations().await?;
        if requeued > 0 {
            tracing::info!(target: "fieldsync::offline", requeued, "failed mutations requeued");
        }
        Ok(requeued)
    }

    /// Operator action: wipe the local store. Never called automatically.
    pub async fn clear_all(&self) -> Result<(), AppError> {
        self.store.clear_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::ConnectionPool;
    use crate::infrastructure::offline::SqliteOfflineStore;
    use serde_json::json;

    async fn setup() -> OfflineService {
        let pool = ConnectionPool::from_memory().await.expect("pool");
        pool.migrate().await.expect("migrations");
        OfflineService::new(Arc::new(SqliteOfflineStore::new(pool.get_pool().clone())))
    }

    #[tokio::test]
    async fn accepted_mutation_is_pending_and_counted() {
        let service = setup().await;

        let mutation = service
            .accept_mutation(
                MutationKind::CostSubmission,
                json!({ "site_visit_id": "s-1", "transport_cost": 150 }),
            )
            .await
            .unwrap();
        assert_eq!(mutation.retry_count, 0);

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.pending_mutations, 1);
    }

    #[tokio::test]
    async fn flags_are_cross_session_state() {
        let service = setup().await;
        service.set_flag("setup_complete", json!(true)).await.unwrap();
        assert_eq!(service.flag("setup_complete").await.unwrap(), Some(json!(true)));
    }
}
