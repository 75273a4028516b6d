use crate::application::ports::{HttpFetch, OfflineStore, SyncRegistrar};
use crate::domain::entities::{CachedResponse, HttpRequest, ServedResponse};
use crate::domain::value_objects::{CacheKey, CacheTier, FetchStrategy, SyncTag};
use crate::infrastructure::messaging::{ForegroundChannel, ForegroundEvent};
use crate::shared::config::{CacheConfig, CacheRules};
use crate::shared::error::AppError;
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub persisted_entries: u64,
    pub memory_entries: u64,
}

/// Network-intercepting proxy. Every outbound request is classified into a
/// tier and answered by one of the fetch strategies; the caller always gets
/// a response, never a raw transport failure.
pub struct CacheService {
    store: Arc<dyn OfflineStore>,
    fetch: Arc<dyn HttpFetch>,
    registrar: Arc<dyn SyncRegistrar>,
    events: Arc<ForegroundChannel>,
    rules: RwLock<CacheRules>,
    api_fresh: Duration,
    stale_ceiling: Duration,
    memory: Mutex<LruCache<String, CachedResponse>>,
}

impl CacheService {
    pub fn new(
        store: Arc<dyn OfflineStore>,
        fetch: Arc<dyn HttpFetch>,
        registrar: Arc<dyn SyncRegistrar>,
        events: Arc<ForegroundChannel>,
        config: &CacheConfig,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.memory_entries).unwrap_or(NonZeroUsize::MIN);

        Self {
            store,
            fetch,
            registrar,
            events,
            rules: RwLock::new(config.rules.clone()),
            api_fresh: Duration::seconds(config.api_fresh_secs as i64),
            stale_ceiling: Duration::seconds(config.stale_ceiling_secs as i64),
            memory: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn set_rules(&self, rules: CacheRules) {
        *self.rules.write().await = rules;
    }

    pub async fn rules(&self) -> CacheRules {
        self.rules.read().await.clone()
    }

    /// Classification, in priority order: navigation, API read, API
    /// mutation, static asset, same-origin dynamic, cross-origin.
    pub async fn classify(&self, request: &HttpRequest) -> FetchStrategy {
        let rules = self.rules.read().await;

        let Ok(parsed) = Url::parse(&request.url) else {
            return FetchStrategy::Bypass;
        };
        let path = parsed.path().to_string();

        if request.is_read() && is_navigation(request) {
            return FetchStrategy::NavigationFallback;
        }

        if rules.api_prefixes.iter().any(|prefix| path.starts_with(prefix)) {
            return if request.is_read() {
                FetchStrategy::NetworkFirst
            } else {
                FetchStrategy::MutationPassThrough
            };
        }

        let is_static = rules.pinned_paths.iter().any(|pinned| pinned == &path)
            || path_extension(&path)
                .map(|ext| rules.static_extensions.iter().any(|known| known == ext))
                .unwrap_or(false);
        if is_static {
            return FetchStrategy::CacheFirst;
        }

        let same_origin = Url::parse(&rules.origin)
            .map(|origin| origin.origin() == parsed.origin())
            .unwrap_or(false);
        if same_origin {
            FetchStrategy::StaleWhileRevalidate
        } else {
            FetchStrategy::Bypass
        }
    }

    pub async fn handle(&self, request: &HttpRequest) -> Result<ServedResponse, AppError> {
        match self.classify(request).await {
            FetchStrategy::NavigationFallback => self.navigation(request).await,
            FetchStrategy::NetworkFirst => self.network_first(request).await,
            FetchStrategy::MutationPassThrough => self.mutation_pass_through(request).await,
            FetchStrategy::CacheFirst => self.cache_first(request).await,
            FetchStrategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
            FetchStrategy::Bypass => {
                let response = self.fetch.execute(request).await?;
                Ok(ServedResponse::network(response))
            }
        }
    }

    /// Prefer the network; on an outage serve the cached copy while it is
    /// younger than the staleness ceiling, disclosing the age to the UI.
    async fn network_first(&self, request: &HttpRequest) -> Result<ServedResponse, AppError> {
        let key = CacheKey::from_request(&request.method, &request.url);

        match self.fetch.execute(request).await {
            Ok(response) if response.is_success() => {
                let entry = CachedResponse::from_response(
                    key,
                    CacheTier::ApiReads,
                    request.url.clone(),
                    &response,
                    Utc::now(),
                    self.stale_ceiling,
                );
                self.store.put_cached_response(&entry).await?;
                Ok(ServedResponse::network(entry.to_response()))
            }
            Ok(response) => Ok(ServedResponse::network(response)),
            Err(err) => {
                tracing::debug!(target: "fieldsync::cache", url = %request.url, "network failed, trying cache: {err}");
                self.serve_stale(&key, &request.url).await
            }
        }
    }

    async fn serve_stale(&self, key: &CacheKey, url: &str) -> Result<ServedResponse, AppError> {
        let Some(entry) = self.store.get_cached_response(key).await? else {
            return Ok(ServedResponse::unavailable());
        };

        let age_ms = entry.age_ms(Utc::now());
        if age_ms >= self.stale_ceiling.num_milliseconds() {
            self.store.invalidate_response(key).await?;
            return Ok(ServedResponse::unavailable());
        }

        self.events.emit(ForegroundEvent::ServedStaleCache {
            url: url.to_string(),
            cache_age_ms: age_ms,
        });
        Ok(ServedResponse::stale(entry.to_response(), age_ms))
    }

    async fn cache_first(&self, request: &HttpRequest) -> Result<ServedResponse, AppError> {
        let key = CacheKey::from_request(&request.method, &request.url);
        let now = Utc::now();

        if let Some(entry) = self.memory_get(&key, now) {
            return Ok(ServedResponse::cached(entry.to_response(), entry.age_ms(now)));
        }

        if let Some(entry) = self.store.get_cached_response(&key).await? {
            self.memory_put(entry.clone());
            return Ok(ServedResponse::cached(entry.to_response(), entry.age_ms(now)));
        }

        match self.fetch.execute(request).await {
            Ok(response) if response.is_success() => {
                let entry = CachedResponse::from_response(
                    key,
                    CacheTier::StaticAssets,
                    request.url.clone(),
                    &response,
                    now,
                    self.stale_ceiling,
                );
                self.store.put_cached_response(&entry).await?;
                self.memory_put(entry.clone());
                Ok(ServedResponse::network(entry.to_response()))
            }
            Ok(response) => Ok(ServedResponse::network(response)),
            Err(err) => {
                tracing::debug!(target: "fieldsync::cache", url = %request.url, "static fetch failed with no cache: {err}");
                Ok(ServedResponse::unavailable())
            }
        }
    }

    /// Serve the cached copy immediately and refresh it off the response
    /// path; only block on the network when nothing is cached yet.
    async fn stale_while_revalidate(
        &self,
        request: &HttpRequest,
    ) -> Result<ServedResponse, AppError> {
        let key = CacheKey::from_request(&request.method, &request.url);
        let now = Utc::now();

        if let Some(entry) = self.store.get_cached_response(&key).await? {
            let age_ms = entry.age_ms(now);
            if age_ms >= self.api_fresh.num_milliseconds() {
                self.spawn_revalidate(request.clone());
            }
            return Ok(ServedResponse::cached(entry.to_response(), age_ms));
        }

        match self.fetch.execute(request).await {
            Ok(response) if response.is_success() => {
                let entry = CachedResponse::from_response(
                    key,
                    CacheTier::Dynamic,
                    request.url.clone(),
                    &response,
                    now,
                    self.stale_ceiling,
                );
                self.store.put_cached_response(&entry).await?;
                Ok(ServedResponse::network(entry.to_response()))
            }
            Ok(response) => Ok(ServedResponse::network(response)),
            Err(_) => Ok(ServedResponse::unavailable()),
        }
    }

    fn spawn_revalidate(&self, request: HttpRequest) {
        let fetch = Arc::clone(&self.fetch);
        let store = Arc::clone(&self.store);
        let ttl = self.stale_ceiling;

        tokio::spawn(async move {
            match fetch.execute(&request).await {
                Ok(response) if response.is_success() => {
                    let key = CacheKey::from_request(&request.method, &request.url);
                    let entry = CachedResponse::from_response(
                        key,
                        CacheTier::Dynamic,
                        request.url.clone(),
                        &response,
                        Utc::now(),
                        ttl,
                    );
                    if let Err(err) = store.put_cached_response(&entry).await {
                        tracing::warn!(target: "fieldsync::cache", "revalidation store failed: {err}");
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(target: "fieldsync::cache", url = %request.url, "background revalidation failed: {err}");
                }
            }
        });
    }

    /// Mutations always go to the network. A success invalidates cached
    /// reads under the mutated resource; a transport failure registers a
    /// background retry and reports the action as accepted, not failed.
    async fn mutation_pass_through(
        &self,
        request: &HttpRequest,
    ) -> Result<ServedResponse, AppError> {
        match self.fetch.execute(request).await {
            Ok(response) if response.is_success() => {
                let prefix = request.url.split('?').next().unwrap_or(&request.url);
                let removed = self.store.invalidate_url_prefix(prefix).await?;
                self.memory_invalidate_prefix(prefix);
                tracing::debug!(target: "fieldsync::cache", %prefix, removed, "invalidated after mutation");

                self.events.emit(ForegroundEvent::MutationSynced {
                    url: request.url.clone(),
                });
                Ok(ServedResponse::network(response))
            }
            Ok(response) => Ok(ServedResponse::network(response)),
            Err(err) => {
                let path = Url::parse(&request.url)
                    .map(|u| u.path().to_string())
                    .unwrap_or_else(|_| request.url.clone());
                let tag = SyncTag::for_resource_path(&path);

                tracing::info!(target: "fieldsync::cache", url = %request.url, %tag, "mutation queued for retry: {err}");
                if let Err(reg_err) = self.registrar.register(tag).await {
                    tracing::warn!(target: "fieldsync::cache", "deferred sync unavailable: {reg_err}");
                    self.events
                        .emit(ForegroundEvent::SyncDeferralUnavailable { tag });
                }
                self.events.emit(ForegroundEvent::MutationQueued {
                    url: request.url.clone(),
                    tag,
                });
                Ok(ServedResponse::accepted_for_retry())
            }
        }
    }

    async fn navigation(&self, request: &HttpRequest) -> Result<ServedResponse, AppError> {
        match self.fetch.execute(request).await {
            Ok(response) => Ok(ServedResponse::network(response)),
            Err(err) => {
                tracing::debug!(target: "fieldsync::cache", "navigation fetch failed, serving offline document: {err}");
                let rules = self.rules.read().await;
                let fallback_url = format!(
                    "{}{}",
                    rules.origin.trim_end_matches('/'),
                    rules.offline_fallback_path
                );
                drop(rules);

                let key = CacheKey::from_request("GET", &fallback_url);
                match self.store.get_cached_response(&key).await? {
                    Some(entry) => {
                        let age_ms = entry.age_ms(Utc::now());
                        Ok(ServedResponse::cached(entry.to_response(), age_ms))
                    }
                    None => Ok(ServedResponse::unavailable()),
                }
            }
        }
    }

    /// Periodic sweep: drop everything older than the staleness ceiling in
    /// every tier, regardless of access.
    pub async fn sweep(&self) -> Result<u64, AppError> {
        let cutoff = Utc::now() - self.stale_ceiling;
        let removed = self.store.evict_cached_before(cutoff).await?;

        let mut memory = self.lock_memory();
        let now = Utc::now();
        let expired: Vec<String> = memory
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            memory.pop(&key);
        }

        Ok(removed)
    }

    /// Warm the API-read cache for a set of URLs.
    pub async fn prefetch(&self, urls: &[String]) -> u64 {
        let requests: Vec<HttpRequest> = urls.iter().map(|u| HttpRequest::get(u.clone())).collect();
        let results =
            futures::future::join_all(requests.iter().map(|req| self.network_first(req))).await;

        results
            .into_iter()
            .filter(|result| matches!(result, Ok(served) if served.response.is_success()))
            .count() as u64
    }

    pub async fn invalidate_entry(&self, url: &str) -> Result<(), AppError> {
        let key = CacheKey::from_request("GET", url);
        self.store.invalidate_response(&key).await?;
        self.lock_memory().pop(key.as_str());
        Ok(())
    }

    pub async fn clear_cache(&self, pattern: &str) -> Result<u64, AppError> {
        let removed = self.store.invalidate_url_prefix(pattern).await?;
        self.memory_invalidate_prefix(pattern);
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<CacheStats, AppError> {
        let persisted = self.store.stats().await?.cached_responses;
        let memory = self.lock_memory().len() as u64;
        Ok(CacheStats {
            persisted_entries: persisted,
            memory_entries: memory,
        })
    }

    fn lock_memory(&self) -> std::sync::MutexGuard<'_, LruCache<String, CachedResponse>> {
        self.memory
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn memory_get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<CachedResponse> {
        let mut memory = self.lock_memory();
        match memory.get(key.as_str()) {
            Some(entry) if !entry.is_expired(now) => Some(entry.clone()),
            Some(_) => {
                memory.pop(key.as_str());
                None
            }
            None => None,
        }
    }

    fn memory_put(&self, entry: CachedResponse) {
        self.lock_memory().put(entry.key.as_str().to_string(), entry);
    }

    fn memory_invalidate_prefix(&self, prefix: &str) {
        let mut memory = self.lock_memory();
        let matching: Vec<String> = memory
            .iter()
            .filter(|(_, entry)| entry.url.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in matching {
            memory.pop(&key);
        }
    }
}

fn is_navigation(request: &HttpRequest) -> bool {
    if request
        .header("sec-fetch-mode")
        .map(|mode| mode.eq_ignore_ascii_case("navigate"))
        .unwrap_or(false)
    {
        return true;
    }
    request
        .header("accept")
        .map(|accept| accept.starts_with("text/html"))
        .unwrap_or(false)
}

fn path_extension(path: &str) -> Option<&str> {
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{HttpResponse, CACHED_AT_HEADER};
    use crate::domain::value_objects::ResponseSource;
    use crate::infrastructure::database::ConnectionPool;
    use crate::infrastructure::messaging::InProcessSyncRegistrar;
    use crate::infrastructure::offline::SqliteOfflineStore;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeFetch {
        responses: Mutex<VecDeque<Result<HttpResponse, AppError>>>,
        calls: AtomicUsize,
    }

    impl FakeFetch {
        fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn push_ok(&self, body: &'static [u8]) {
            self.responses.lock().unwrap().push_back(Ok(HttpResponse {
                status: 200,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: Bytes::from_static(body),
            }));
        }

        fn push_err(&self) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(AppError::Network("connection refused".to_string())));
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpFetch for FakeFetch {
        async fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::Network("no scripted response".to_string())))
        }
    }

    struct Harness {
        cache: CacheService,
        store: Arc<dyn OfflineStore>,
        fetch: Arc<FakeFetch>,
        registrar: Arc<InProcessSyncRegistrar>,
        events: Arc<ForegroundChannel>,
    }

    async fn setup() -> Harness {
        let pool = ConnectionPool::from_memory().await.expect("pool");
        pool.migrate().await.expect("migrations");
        let store: Arc<dyn OfflineStore> =
            Arc::new(SqliteOfflineStore::new(pool.get_pool().clone()));
        let fetch = Arc::new(FakeFetch::new());
        let registrar = Arc::new(InProcessSyncRegistrar::default());
        let events = Arc::new(ForegroundChannel::default());

        let mut config = CacheConfig {
            api_fresh_secs: 300,
            stale_ceiling_secs: 86_400,
            sweep_interval_secs: 3_600,
            memory_entries: 16,
            rules: CacheRules::default(),
        };
        config.rules.origin = "https://app.example.org".to_string();

        let cache = CacheService::new(
            Arc::clone(&store) as Arc<dyn OfflineStore>,
            Arc::clone(&fetch) as Arc<dyn HttpFetch>,
            Arc::clone(&registrar) as Arc<dyn SyncRegistrar>,
            Arc::clone(&events),
            &config,
        );

        Harness {
            cache,
            store,
            fetch,
            registrar,
            events,
        }
    }

    const API_URL: &str = "https://app.example.org/rest/v1/site_visits?select=*";

    async fn seed_api_entry(store: &Arc<dyn OfflineStore>, url: &str, age: Duration, body: &'static [u8]) {
        let response = HttpResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Bytes::from_static(body),
        };
        let entry = CachedResponse::from_response(
            CacheKey::from_request("GET", url),
            CacheTier::ApiReads,
            url.to_string(),
            &response,
            Utc::now() - age,
            Duration::hours(24),
        );
        store.put_cached_response(&entry).await.expect("seed entry");
    }

    #[tokio::test]
    async fn classification_follows_priority_order() {
        let h = setup().await;

        let mut navigation = HttpRequest::get("https://app.example.org/dashboard");
        navigation
            .headers
            .push(("accept".to_string(), "text/html,application/xhtml+xml".to_string()));
        assert_eq!(
            h.cache.classify(&navigation).await,
            FetchStrategy::NavigationFallback
        );

        assert_eq!(
            h.cache.classify(&HttpRequest::get(API_URL)).await,
            FetchStrategy::NetworkFirst
        );

        let mutation = HttpRequest {
            method: "POST".to_string(),
            url: "https://app.example.org/rest/v1/cost_submissions".to_string(),
            headers: Vec::new(),
            body: Some(Bytes::from_static(b"{}")),
        };
        assert_eq!(
            h.cache.classify(&mutation).await,
            FetchStrategy::MutationPassThrough
        );

        assert_eq!(
            h.cache
                .classify(&HttpRequest::get("https://app.example.org/assets/app.js"))
                .await,
            FetchStrategy::CacheFirst
        );

        assert_eq!(
            h.cache
                .classify(&HttpRequest::get("https://app.example.org/api/health"))
                .await,
            FetchStrategy::StaleWhileRevalidate
        );

        // Static extensions outrank the origin split.
        assert_eq!(
            h.cache
                .classify(&HttpRequest::get("https://fonts.example.net/font.woff2"))
                .await,
            FetchStrategy::CacheFirst
        );

        assert_eq!(
            h.cache
                .classify(&HttpRequest::get("https://analytics.example.net/collect"))
                .await,
            FetchStrategy::Bypass
        );
    }

    #[tokio::test]
    async fn api_read_prefers_fresh_network_over_existing_cache() {
        let h = setup().await;
        seed_api_entry(&h.store, API_URL, Duration::hours(1), b"[\"old\"]").await;
        h.fetch.push_ok(b"[\"new\"]");

        let served = h.cache.handle(&HttpRequest::get(API_URL)).await.unwrap();

        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.body.as_ref(), b"[\"new\"]");
        assert!(served.response.header(CACHED_AT_HEADER).is_some());

        // The fresh bytes replaced the stale entry in storage.
        let key = CacheKey::from_request("GET", API_URL);
        let stored = h.store.get_cached_response(&key).await.unwrap().unwrap();
        assert_eq!(stored.body.as_ref(), b"[\"new\"]");
    }

    #[tokio::test]
    async fn outage_serves_bounded_stale_cache_with_disclosure() {
        let h = setup().await;
        let mut rx = h.events.subscribe();
        seed_api_entry(&h.store, API_URL, Duration::hours(2), b"[\"cached\"]").await;
        h.fetch.push_err();

        let served = h.cache.handle(&HttpRequest::get(API_URL)).await.unwrap();

        assert_eq!(served.source, ResponseSource::StaleCache);
        assert_eq!(served.response.body.as_ref(), b"[\"cached\"]");
        let age = served.cache_age_ms.expect("age");
        assert!((age - 7_200_000).abs() < 5_000, "age was {age}");

        match rx.recv().await.expect("event") {
            ForegroundEvent::ServedStaleCache { url, cache_age_ms } => {
                assert_eq!(url, API_URL);
                assert!((cache_age_ms - 7_200_000).abs() < 5_000);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn entry_at_staleness_ceiling_is_evicted_not_served() {
        let h = setup().await;
        seed_api_entry(&h.store, API_URL, Duration::hours(24), b"[\"ancient\"]").await;
        h.fetch.push_err();

        let served = h.cache.handle(&HttpRequest::get(API_URL)).await.unwrap();

        assert_eq!(served.source, ResponseSource::Synthetic);
        assert_eq!(served.response.status, 503);

        let key = CacheKey::from_request("GET", API_URL);
        assert!(h.store.get_cached_response(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn static_assets_are_served_from_cache_after_first_fetch() {
        let h = setup().await;
        let url = "https://app.example.org/assets/app.js";
        h.fetch.push_ok(b"console.log(1)");

        let first = h.cache.handle(&HttpRequest::get(url)).await.unwrap();
        assert_eq!(first.source, ResponseSource::Network);

        let second = h.cache.handle(&HttpRequest::get(url)).await.unwrap();
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(second.response.body.as_ref(), b"console.log(1)");
        assert_eq!(h.fetch.calls(), 1);
    }

    #[tokio::test]
    async fn static_fetch_failure_without_cache_is_synthetic_503() {
        let h = setup().await;
        h.fetch.push_err();

        let served = h
            .cache
            .handle(&HttpRequest::get("https://app.example.org/assets/app.css"))
            .await
            .unwrap();
        assert_eq!(served.source, ResponseSource::Synthetic);
        assert_eq!(served.response.status, 503);
    }

    #[tokio::test]
    async fn failed_mutation_is_accepted_for_retry() {
        let h = setup().await;
        let mut rx = h.events.subscribe();
        h.fetch.push_err();

        let request = HttpRequest {
            method: "POST".to_string(),
            url: "https://app.example.org/rest/v1/cost_submissions".to_string(),
            headers: Vec::new(),
            body: Some(Bytes::from_static(b"{\"amount\":100}")),
        };
        let served = h.cache.handle(&request).await.unwrap();

        assert!(served.queued);
        assert_eq!(served.response.status, 503);
        assert_eq!(
            served.response.header(crate::domain::entities::QUEUED_HEADER),
            Some("true")
        );
        assert_eq!(
            h.registrar.take_registered(),
            vec![SyncTag::CostSubmissions]
        );

        match rx.recv().await.expect("event") {
            ForegroundEvent::MutationQueued { tag, .. } => {
                assert_eq!(tag, SyncTag::CostSubmissions)
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn successful_mutation_invalidates_cached_reads_for_the_resource() {
        let h = setup().await;
        seed_api_entry(
            &h.store,
            "https://app.example.org/rest/v1/site_visits?select=*",
            Duration::minutes(1),
            b"[\"stale list\"]",
        )
        .await;
        h.fetch.push_ok(b"{\"ok\":true}");

        let request = HttpRequest {
            method: "PATCH".to_string(),
            url: "https://app.example.org/rest/v1/site_visits?id=eq.abc".to_string(),
            headers: Vec::new(),
            body: Some(Bytes::from_static(b"{}")),
        };
        let served = h.cache.handle(&request).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);

        let key = CacheKey::from_request("GET", "https://app.example.org/rest/v1/site_visits?select=*");
        assert!(h.store.get_cached_response(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_while_revalidate_serves_cache_then_refreshes() {
        let h = setup().await;
        let url = "https://app.example.org/api/health";
        seed_api_entry(&h.store, url, Duration::minutes(10), b"{\"status\":\"old\"}").await;
        h.fetch.push_ok(b"{\"status\":\"new\"}");

        let served = h.cache.handle(&HttpRequest::get(url)).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body.as_ref(), b"{\"status\":\"old\"}");

        // Give the background refresh a moment to land.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let key = CacheKey::from_request("GET", url);
        let stored = h.store.get_cached_response(&key).await.unwrap().unwrap();
        assert_eq!(stored.body.as_ref(), b"{\"status\":\"new\"}");
    }

    #[tokio::test]
    async fn navigation_outage_serves_pinned_offline_document() {
        let h = setup().await;
        let fallback_url = "https://app.example.org/offline.html";
        let response = HttpResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: Bytes::from_static(b"<html>offline</html>"),
        };
        let entry = CachedResponse::from_response(
            CacheKey::from_request("GET", fallback_url),
            CacheTier::StaticAssets,
            fallback_url.to_string(),
            &response,
            Utc::now(),
            Duration::hours(24),
        );
        h.store.put_cached_response(&entry).await.unwrap();
        h.fetch.push_err();

        let mut request = HttpRequest::get("https://app.example.org/dashboard");
        request
            .headers
            .push(("sec-fetch-mode".to_string(), "navigate".to_string()));

        let served = h.cache.handle(&request).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body.as_ref(), b"<html>offline</html>");
    }

    #[tokio::test]
    async fn sweep_drops_entries_past_the_ceiling() {
        let h = setup().await;
        seed_api_entry(&h.store, API_URL, Duration::hours(24), b"[]").await;
        seed_api_entry(
            &h.store,
            "https://app.example.org/rest/v1/budgets",
            Duration::hours(1),
            b"[]",
        )
        .await;

        let removed = h.cache.sweep().await.unwrap();
        assert_eq!(removed, 1);

        let stats = h.cache.stats().await.unwrap();
        assert_eq!(stats.persisted_entries, 1);
    }

    #[tokio::test]
    async fn prefetch_warms_the_api_cache() {
        let h = setup().await;
        h.fetch.push_ok(b"[1]");
        h.fetch.push_ok(b"[2]");

        let warmed = h
            .cache
            .prefetch(&[
                "https://app.example.org/rest/v1/site_visits".to_string(),
                "https://app.example.org/rest/v1/budgets".to_string(),
            ])
            .await;
        assert_eq!(warmed, 2);

        let stats = h.cache.stats().await.unwrap();
        assert_eq!(stats.persisted_entries, 2);
    }
}
