use crate::application::ports::OfflineStore;
use crate::application::services::cache_service::CacheService;
use crate::application::services::scheduler::BackgroundScheduler;
use crate::application::services::sync_service::SyncError;
use crate::presentation::dto::{CommandReply, ForegroundCommand};
use crate::shared::error::AppError;
use serde_json::json;
use std::sync::Arc;

/// Routes foreground commands onto the services. One command, at most one
/// reply.
pub struct MessageHandler {
    cache: Arc<CacheService>,
    scheduler: Arc<BackgroundScheduler>,
    store: Arc<dyn OfflineStore>,
}

impl MessageHandler {
    pub fn new(
        cache: Arc<CacheService>,
        scheduler: Arc<BackgroundScheduler>,
        store: Arc<dyn OfflineStore>,
    ) -> Self {
        Self {
            cache,
            scheduler,
            store,
        }
    }

    pub async fn handle(&self, command: ForegroundCommand) -> Result<CommandReply, AppError> {
        match command {
            ForegroundCommand::SetConfig { rules } => {
                self.cache.set_rules(rules).await;
                Ok(CommandReply::Ack)
            }
            ForegroundCommand::SkipWaiting => {
                self.store
                    .set_app_state("activate_immediately", json!(true))
                    .await?;
                Ok(CommandReply::Ack)
            }
            ForegroundCommand::GetVersion => Ok(CommandReply::Version {
                version: env!("CARGO_PKG_VERSION").to_string(),
            }),
            ForegroundCommand::TriggerSync { tag } => {
                match self.scheduler.trigger_sync(tag).await {
                    Ok(_) => {}
                    // Routine refusals; the outcome reaches the foreground
                    // through the event channel.
                    Err(SyncError::Offline) | Err(SyncError::AlreadyRunning) => {
                        tracing::debug!(target: "fieldsync::messages", %tag, "sync trigger refused");
                    }
                    Err(SyncError::Store(err)) => return Err(err),
                }
                Ok(CommandReply::Ack)
            }
            ForegroundCommand::ClearCache { pattern } => {
                self.cache.clear_cache(&pattern).await?;
                Ok(CommandReply::Ack)
            }
            ForegroundCommand::InvalidateEntry { url } => {
                self.cache.invalidate_entry(&url).await?;
                Ok(CommandReply::Ack)
            }
            ForegroundCommand::GetCacheStats => {
                let stats = self.cache.stats().await?;
                Ok(CommandReply::CacheStats {
                    persisted_entries: stats.persisted_entries,
                    memory_entries: stats.memory_entries,
                })
            }
            ForegroundCommand::Prefetch { urls } => {
                let warmed = self.cache.prefetch(&urls).await;
                tracing::debug!(target: "fieldsync::messages", warmed, "prefetch finished");
                Ok(CommandReply::Ack)
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
    use crate::application::ports::{ConnectivityProbe, HttpFetch, SyncRegistrar};
    use crate::application::services::auto_release_service::AutoReleaseService;
    use crate::application::services::sync_service::SyncOrchestrator;
    use crate::domain::entities::{HttpRequest, HttpResponse};
    use crate::domain::value_objects::{GeoPoint, SyncTag};
    use crate::infrastructure::connectivity::WatchConnectivity;
    use crate::infrastructure::database::ConnectionPool;
    use crate::infrastructure::messaging::{ForegroundChannel, InProcessSyncRegistrar};
    use crate::infrastructure::offline::SqliteOfflineStore;
    use crate::shared::config::{CacheConfig, CacheRules, SyncConfig};
    use chrono::{DateTime, Utc};

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

    async fn setup(online: bool) -> MessageHandler {
        let pool = ConnectionPool::from_memory().await.expect("pool");
        pool.migrate().await.expect("migrations");
        let store: Arc<dyn OfflineStore> =
            Arc::new(SqliteOfflineStore::new(pool.get_pool().clone()));
        let remote: Arc<dyn RemoteApi> = Arc::new(OkRemote);
        let connectivity = Arc::new(WatchConnectivity::new(online));
        let registrar = Arc::new(InProcessSyncRegistrar::default());
        let events = Arc::new(ForegroundChannel::default());

        let sync_config = SyncConfig {
            auto_sync: false,
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
            Arc::clone(&cache),
            Arc::clone(&connectivity) as Arc<dyn ConnectivityProbe>,
            Arc::clone(&registrar) as Arc<dyn SyncRegistrar>,
            Arc::clone(&events),
            sync_config,
            &cache_config,
        ));

        MessageHandler::new(cache, scheduler, store)
    }

    #[tokio::test]
    async fn get_version_replies_synchronously() {
        let handler = setup(true).await;
        let reply = handler.handle(ForegroundCommand::GetVersion).await.unwrap();
        assert_eq!(
            reply,
            CommandReply::Version {
                version: env!("CARGO_PKG_VERSION").to_string()
            }
        );
    }

    #[tokio::test]
    async fn get_cache_stats_replies_with_counts() {
        let handler = setup(true).await;
        let reply = handler
            .handle(ForegroundCommand::GetCacheStats)
            .await
            .unwrap();
        assert_eq!(
            reply,
            CommandReply::CacheStats {
                persisted_entries: 0,
                memory_entries: 0
            }
        );
    }

    #[tokio::test]
    async fn set_config_swaps_the_classification_rules() {
        let handler = setup(true).await;
        let mut rules = CacheRules::default();
        rules.api_prefixes = vec!["/api/v2/".to_string()];

        let reply = handler
            .handle(ForegroundCommand::SetConfig {
                rules: rules.clone(),
            })
            .await
            .unwrap();
        assert_eq!(reply, CommandReply::Ack);
        assert_eq!(handler.cache.rules().await.api_prefixes, rules.api_prefixes);
    }

    #[tokio::test]
    async fn offline_sync_trigger_still_acknowledges() {
        let handler = setup(false).await;
        let reply = handler
            .handle(ForegroundCommand::TriggerSync {
                tag: SyncTag::PendingActions,
            })
            .await
            .unwrap();
        assert_eq!(reply, CommandReply::Ack);
    }

    #[tokio::test]
    async fn skip_waiting_sets_the_activation_flag() {
        let handler = setup(true).await;
        handler
            .handle(ForegroundCommand::SkipWaiting)
            .await
            .unwrap();

        let flag = handler
            .store
            .get_app_state("activate_immediately")
            .await
            .unwrap();
        assert_eq!(flag, Some(json!(true)));
    }
}
