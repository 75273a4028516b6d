use crate::application::ports::{ConnectivityProbe, SyncRegistrar};
use crate::application::services::auto_release_service::AutoReleaseService;
use crate::application::services::cache_service::CacheService;
use crate::application::services::sync_service::{SyncError, SyncOrchestrator};
use crate::domain::entities::SyncReport;
use crate::domain::value_objects::SyncTag;
use crate::infrastructure::messaging::{ForegroundChannel, ForegroundEvent};
use crate::shared::config::{CacheConfig, SyncConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Decides when a drain pass runs: connectivity regained (debounced), a
/// fixed interval for the auto-release sweep, the hourly cache sweep, and
/// explicit triggers from the UI or a host background-sync callback.
pub struct BackgroundScheduler {
    orchestrator: Arc<SyncOrchestrator>,
    auto_release: Arc<AutoReleaseService>,
    cache: Arc<CacheService>,
    connectivity: Arc<dyn ConnectivityProbe>,
    registrar: Arc<dyn SyncRegistrar>,
    events: Arc<ForegroundChannel>,
    sync_config: SyncConfig,
    cache_sweep_interval: Duration,
}

impl BackgroundScheduler {
    pub fn new(
        orchestrator: Arc<SyncOrchestrator>,
        auto_release: Arc<AutoReleaseService>,
        cache: Arc<CacheService>,
        connectivity: Arc<dyn ConnectivityProbe>,
        registrar: Arc<dyn SyncRegistrar>,
        events: Arc<ForegroundChannel>,
        sync_config: SyncConfig,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            orchestrator,
            auto_release,
            cache,
            connectivity,
            registrar,
            events,
            sync_config,
            cache_sweep_interval: Duration::from_secs(cache_config.sweep_interval_secs),
        }
    }

    /// Start the background loops. Handles are returned so a host that
    /// shuts down cleanly can abort them.
    pub fn spawn(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        if self.sync_config.auto_sync {
            let scheduler = Arc::clone(self);
            handles.push(tokio::spawn(async move {
                scheduler.watch_connectivity().await;
            }));

            let scheduler = Arc::clone(self);
            handles.push(tokio::spawn(async move {
                scheduler.auto_release_loop().await;
            }));
        }

        let scheduler = Arc::clone(self);
        handles.push(tokio::spawn(async move {
            scheduler.cache_sweep_loop().await;
        }));

        handles
    }

    /// Explicit trigger from the UI or a host background-sync callback.
    pub async fn trigger_sync(&self, tag: SyncTag) -> Result<SyncReport, SyncError> {
        tracing::info!(target: "fieldsync::scheduler", %tag, "manual sync trigger");
        self.orchestrator.drain().await
    }

    /// Best-effort deferred sync. When the host cannot register one, the
    /// foreground is told immediately so it can keep the app open.
    pub async fn defer_sync(&self, tag: SyncTag) {
        if let Err(err) = self.registrar.register(tag).await {
            tracing::warn!(target: "fieldsync::scheduler", %tag, "deferred sync unavailable: {err}");
            self.events
                .emit(ForegroundEvent::SyncDeferralUnavailable { tag });
        }
    }

    async fn watch_connectivity(&self) {
        let mut rx = self.connectivity.subscribe();
        let mut was_online = *rx.borrow();

        while rx.changed().await.is_ok() {
            let online = *rx.borrow();
            if online && !was_online {
                // Let the network stack settle before draining.
                tokio::time::sleep(Duration::from_secs(self.sync_config.reconnect_debounce)).await;
                match self.orchestrator.drain().await {
                    Ok(report) => tracing::info!(
                        target: "fieldsync::scheduler",
                        synced = report.synced,
                        failed = report.failed,
                        "reconnect drain finished"
                    ),
                    Err(SyncError::AlreadyRunning) | Err(SyncError::Offline) => {
                        tracing::debug!(target: "fieldsync::scheduler", "reconnect drain skipped");
                    }
                    Err(err) => {
                        tracing::error!(target: "fieldsync::scheduler", "reconnect drain failed: {err}");
                    }
                }
            }
            was_online = online;
        }
    }

    async fn auto_release_loop(&self) {
        let mut interval = tokio::time::interval(Duration::from_secs(
            self.sync_config.auto_release_interval.max(1),
        ));
        interval.tick().await;

        loop {
            interval.tick().await;
            if !self.connectivity.is_online().await {
                continue;
            }
            match self.auto_release.sweep().await {
                Ok(report) if report.processed > 0 => tracing::info!(
                    target: "fieldsync::scheduler",
                    processed = report.processed,
                    released = report.released,
                    errors = report.errors,
                    "auto-release sweep finished"
                ),
                Ok(_) => {}
                Err(SyncError::AlreadyRunning) | Err(SyncError::Offline) => {}
                Err(err) => {
                    tracing::error!(target: "fieldsync::scheduler", "auto-release sweep failed: {err}");
                }
            }
        }
    }

    async fn cache_sweep_loop(&self) {
        let mut interval = tokio::time::interval(self.cache_sweep_interval);
        interval.tick().await;

        loop {
            interval.tick().await;
            match self.cache.sweep().await {
                Ok(removed) if removed > 0 => {
                    tracing::info!(target: "fieldsync::scheduler", removed, "cache sweep evicted entries");
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(target: "fieldsync::scheduler", "cache sweep failed: {err}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::remote_api::{
        CostSubmission, ReleaseCandidate, RemoteApi, VisitFees,
    };
    use crate::application::ports::{HttpFetch, OfflineStore};
    use crate::domain::entities::{HttpRequest, HttpResponse, MutationDraft};
    use crate::domain::value_objects::mutation::MutationKind;
    use crate::domain::value_objects::GeoPoint;
    use crate::infrastructure::connectivity::WatchConnectivity;
    use crate::infrastructure::database::ConnectionPool;
    use crate::infrastructure::messaging::InProcessSyncRegistrar;
    use crate::infrastructure::offline::SqliteOfflineStore;
    use crate::shared::config::CacheRules;
    use crate::shared::error::AppError;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    struct OkRemote;

    #[async_trait::async_trait]
    impl RemoteApi for OkRemote {
        async fn start_visit(
            &self,
            _site_entry_id: &str,
            _started_at: DateTime<Utc>,
            _location: Option<&GeoPoint>,
        ) -> Result<(), AppError> {
            Ok(())
        }

        async fn complete_visit(
            &self,
            _site_entry_id: &str,
            _completed_at: DateTime<Utc>,
            _location: Option<&GeoPoint>,
            _notes: Option<&str>,
        ) -> Result<(), AppError> {
            Ok(())
        }

        async fn visit_remote_status(
            &self,
            _site_entry_id: &str,
        ) -> Result<Option<String>, AppError> {
            Ok(None)
        }

        async fn visit_fees(&self, _site_entry_id: &str) -> Result<VisitFees, AppError> {
            Ok(VisitFees::default())
        }

        async fn update_current_location(
            &self,
            _user_id: &str,
            _point: &GeoPoint,
            _recorded_at: DateTime<Utc>,
        ) -> Result<(), AppError> {
            Ok(())
        }

        async fn submit_cost(&self, _submission: &CostSubmission) -> Result<(), AppError> {
            Ok(())
        }

        async fn upload_photo(
            &self,
            _site_entry_id: &str,
            _file_name: &str,
            _content: &[u8],
        ) -> Result<(), AppError> {
            Ok(())
        }

        async fn credit_wallet(
            &self,
            _user_id: &str,
            _amount: i64,
            _reference_id: &str,
        ) -> Result<(), AppError> {
            Ok(())
        }

        async fn release_candidates(
            &self,
            _now: DateTime<Utc>,
        ) -> Result<Vec<ReleaseCandidate>, AppError> {
            Ok(Vec::new())
        }

        async fn release_claim(&self, _site_id: &str) -> Result<(), AppError> {
            Ok(())
        }
    }

    struct NeverFetch;

    #[async_trait::async_trait]
    impl HttpFetch for NeverFetch {
        async fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, AppError> {
            Err(AppError::Network("no network in test".to_string()))
        }
    }

    struct Harness {
        scheduler: Arc<BackgroundScheduler>,
        store: Arc<dyn OfflineStore>,
        connectivity: Arc<WatchConnectivity>,
        registrar: Arc<InProcessSyncRegistrar>,
        events: Arc<ForegroundChannel>,
    }

    async fn setup(online: bool, registrar_supported: bool) -> Harness {
        let pool = ConnectionPool::from_memory().await.expect("pool");
        pool.migrate().await.expect("migrations");
        let store: Arc<dyn OfflineStore> =
            Arc::new(SqliteOfflineStore::new(pool.get_pool().clone()));
        let remote: Arc<dyn RemoteApi> = Arc::new(OkRemote);
        let connectivity = Arc::new(WatchConnectivity::new(online));
        let registrar = Arc::new(InProcessSyncRegistrar::new(registrar_supported));
        let events = Arc::new(ForegroundChannel::default());

        let sync_config = SyncConfig {
            auto_sync: true,
            auto_release_interval: 3_600,
            reconnect_debounce: 0,
            max_retries: 3,
            base_retry_delay_ms: 1,
            max_retry_delay_ms: 10,
        };
        let cache_config = CacheConfig {
            api_fresh_secs: 300,
            stale_ceiling_secs: 86_400,
            sweep_interval_secs: 3_600,
            memory_entries: 16,
            rules: CacheRules::default(),
        };

        let orchestrator = Arc::new(SyncOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            Arc::clone(&connectivity) as Arc<dyn ConnectivityProbe>,
            Arc::clone(&events),
            "user-1".to_string(),
            sync_config.clone(),
        ));
        let auto_release = Arc::new(AutoReleaseService::new(
            Arc::clone(&remote),
            Arc::clone(&connectivity) as Arc<dyn ConnectivityProbe>,
            Arc::clone(&events),
        ));
        let cache = Arc::new(CacheService::new(
            Arc::clone(&store),
            Arc::new(NeverFetch) as Arc<dyn HttpFetch>,
            Arc::clone(&registrar) as Arc<dyn SyncRegistrar>,
            Arc::clone(&events),
            &cache_config,
        ));

        let scheduler = Arc::new(BackgroundScheduler::new(
            orchestrator,
            auto_release,
            cache,
            Arc::clone(&connectivity) as Arc<dyn ConnectivityProbe>,
            Arc::clone(&registrar) as Arc<dyn SyncRegistrar>,
            Arc::clone(&events),
            sync_config,
            &cache_config,
        ));

        Harness {
            scheduler,
            store,
            connectivity,
            registrar,
            events,
        }
    }

    #[tokio::test]
    async fn reconnect_triggers_a_debounced_drain() {
        let h = setup(false, true).await;
        h.store
            .enqueue_mutation(MutationDraft::new(
                MutationKind::CostSubmission,
                json!({
                    "user_id": "user-1",
                    "site_visit_id": "c-1",
                    "transport_cost": 100,
                    "other_costs": 0,
                }),
            ))
            .await
            .unwrap();

        let handles = h.scheduler.spawn();
        // Let the watcher task subscribe before flipping connectivity.
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.connectivity.set_online(true);

        // Debounce is zero in tests; give the watcher a moment to drain.
        for _ in 0..50 {
            if h.store.due_mutations().await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(h.store.due_mutations().await.unwrap().is_empty());

        for handle in handles {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn manual_trigger_drains_immediately() {
        let h = setup(true, true).await;
        h.store
            .enqueue_mutation(MutationDraft::new(
                MutationKind::CostSubmission,
                json!({
                    "user_id": "user-1",
                    "site_visit_id": "c-2",
                    "transport_cost": 50,
                    "other_costs": 0,
                }),
            ))
            .await
            .unwrap();

        let report = h
            .scheduler
            .trigger_sync(SyncTag::PendingActions)
            .await
            .expect("report");
        assert_eq!(report.synced, 1);
    }

    #[tokio::test]
    async fn defer_sync_registers_when_the_host_supports_it() {
        let h = setup(true, true).await;
        h.scheduler.defer_sync(SyncTag::SiteVisits).await;
        assert_eq!(h.registrar.take_registered(), vec![SyncTag::SiteVisits]);
    }

    #[tokio::test]
    async fn defer_sync_falls_back_to_foreground_notice() {
        let h = setup(true, false).await;
        let mut rx = h.events.subscribe();

        h.scheduler.defer_sync(SyncTag::Notifications).await;

        match rx.recv().await.expect("event") {
            ForegroundEvent::SyncDeferralUnavailable { tag } => {
                assert_eq!(tag, SyncTag::Notifications)
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
