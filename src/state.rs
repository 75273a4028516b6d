use crate::application::ports::{
    ConnectivityProbe, HttpFetch, OfflineStore, RemoteApi, SyncRegistrar,
};
use crate::application::services::{
    AutoReleaseService, BackgroundScheduler, CacheService, OfflineService, SyncOrchestrator,
};
use crate::infrastructure::connectivity::WatchConnectivity;
use crate::infrastructure::database::ConnectionPool;
use crate::infrastructure::http::{ReqwestFetch, RestRemoteApi};
use crate::infrastructure::messaging::{ForegroundChannel, InProcessSyncRegistrar};
use crate::infrastructure::offline::SqliteOfflineStore;
use crate::presentation::handlers::{MessageHandler, PushHandler};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// The explicitly owned composition root. Built once at process start;
/// every component hangs off it by `Arc` — no ambient global state.
pub struct SyncCore {
    pub config: AppConfig,
    pub pool: ConnectionPool,
    pub store: Arc<dyn OfflineStore>,
    pub events: Arc<ForegroundChannel>,
    pub connectivity: Arc<WatchConnectivity>,
    pub cache: Arc<CacheService>,
    pub offline: Arc<OfflineService>,
    pub orchestrator: Arc<SyncOrchestrator>,
    pub auto_release: Arc<AutoReleaseService>,
    pub scheduler: Arc<BackgroundScheduler>,
    pub messages: Arc<MessageHandler>,
    pub push: Arc<PushHandler>,
}

impl SyncCore {
    pub async fn initialize(
        config: AppConfig,
        user_id: impl Into<String>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;
        ensure_database_dir(&config.database.url)?;

        let pool =
            ConnectionPool::new(&config.database.url, config.database.max_connections).await?;
        pool.migrate().await?;

        let store: Arc<dyn OfflineStore> =
            Arc::new(SqliteOfflineStore::new(pool.get_pool().clone()));
        let events = Arc::new(ForegroundChannel::default());
        let connectivity = Arc::new(WatchConnectivity::new(true));
        let registrar: Arc<dyn SyncRegistrar> = Arc::new(InProcessSyncRegistrar::default());

        let fetch: Arc<dyn HttpFetch> = Arc::new(ReqwestFetch::new(config.remote.request_timeout)?);
        let remote: Arc<dyn RemoteApi> = Arc::new(RestRemoteApi::new(&config.remote)?);

        let cache = Arc::new(CacheService::new(
            Arc::clone(&store),
            fetch,
            Arc::clone(&registrar),
            Arc::clone(&events),
            &config.cache,
        ));
        let offline = Arc::new(OfflineService::new(Arc::clone(&store)));
        let orchestrator = Arc::new(SyncOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            Arc::clone(&connectivity) as Arc<dyn ConnectivityProbe>,
            Arc::clone(&events),
            user_id.into(),
            config.sync.clone(),
        ));
        let auto_release = Arc::new(AutoReleaseService::new(
            Arc::clone(&remote),
            Arc::clone(&connectivity) as Arc<dyn ConnectivityProbe>,
            Arc::clone(&events),
        ));
        let scheduler = Arc::new(BackgroundScheduler::new(
            Arc::clone(&orchestrator),
            Arc::clone(&auto_release),
            Arc::clone(&cache),
            Arc::clone(&connectivity) as Arc<dyn ConnectivityProbe>,
            Arc::clone(&registrar),
            Arc::clone(&events),
            config.sync.clone(),
            &config.cache,
        ));
        let messages = Arc::new(MessageHandler::new(
            Arc::clone(&cache),
            Arc::clone(&scheduler),
            Arc::clone(&store),
        ));
        let push = Arc::new(PushHandler::new(Arc::clone(&events)));

        Ok(Self {
            config,
            pool,
            store,
            events,
            connectivity,
            cache,
            offline,
            orchestrator,
            auto_release,
            scheduler,
            messages,
            push,
        })
    }

    /// Start the scheduler's background loops.
    pub fn start_background_jobs(&self) -> Vec<JoinHandle<()>> {
        self.scheduler.spawn()
    }

    /// Feed a connectivity transition from the host platform.
    pub fn set_online(&self, online: bool) {
        self.connectivity.set_online(online);
    }

    pub async fn shutdown(&self) {
        self.pool.close().await;
    }
}

fn ensure_database_dir(database_url: &str) -> Result<(), AppError> {
    let Some(path) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(':') {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|err| AppError::Storage(format!("create data directory: {err}")))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initialize_wires_the_whole_core() {
        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:?cache=shared".to_string();

        let core = SyncCore::initialize(config, "user-1").await.expect("core");

        let stats = core.offline.stats().await.expect("stats");
        assert_eq!(stats.total_unsynced(), 0);
        assert!(!core.orchestrator.is_running());

        core.shutdown().await;
    }

    #[test]
    fn memory_urls_need_no_directory() {
        assert!(ensure_database_dir("sqlite::memory:?cache=shared").is_ok());
        assert!(ensure_database_dir("postgres://elsewhere").is_ok());
    }
}
