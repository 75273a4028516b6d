use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    /// Seconds between scheduled auto-release sweeps.
    pub auto_release_interval: u64,
    /// Seconds to wait after connectivity returns before draining.
    pub reconnect_debounce: u64,
    pub max_retries: u32,
    pub base_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Window during which an API read is preferred fresh from the network.
    pub api_fresh_secs: u64,
    /// Hard ceiling on serving stale cache during an outage.
    pub stale_ceiling_secs: u64,
    pub sweep_interval_secs: u64,
    pub memory_entries: usize,
    pub rules: CacheRules,
}

/// URL classification input. Configuration data, adjustable at runtime
/// through the `set_config` foreground command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheRules {
    pub api_prefixes: Vec<String>,
    pub static_extensions: Vec<String>,
    pub pinned_paths: Vec<String>,
    pub offline_fallback_path: String,
    pub origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: default_database_url(),
                max_connections: 5,
                connection_timeout: 30,
            },
            remote: RemoteConfig {
                base_url: "http://localhost:54321".to_string(),
                request_timeout: 30,
            },
            sync: SyncConfig {
                auto_sync: true,
                auto_release_interval: 300,
                reconnect_debounce: 5,
                max_retries: 3,
                base_retry_delay_ms: 1_000,
                max_retry_delay_ms: 60_000,
            },
            cache: CacheConfig {
                api_fresh_secs: 300,
                stale_ceiling_secs: 86_400,
                sweep_interval_secs: 3_600,
                memory_entries: 128,
                rules: CacheRules::default(),
            },
        }
    }
}

impl Default for CacheRules {
    fn default() -> Self {
        Self {
            api_prefixes: vec!["/rest/v1/".to_string()],
            static_extensions: vec![
                "js".to_string(),
                "css".to_string(),
                "png".to_string(),
                "jpg".to_string(),
                "svg".to_string(),
                "woff2".to_string(),
                "ico".to_string(),
            ],
            pinned_paths: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/offline.html".to_string(),
                "/manifest.json".to_string(),
            ],
            offline_fallback_path: "/offline.html".to_string(),
            origin: "http://localhost:8080".to_string(),
        }
    }
}

fn default_database_url() -> String {
    let dir = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("./data"));
    format!("sqlite:{}?mode=rwc", dir.join("fieldsync/offline.db").display())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FIELDSYNC_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v;
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_REMOTE_URL") {
            if !v.trim().is_empty() {
                cfg.remote.base_url = v;
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Ok(v) = std::env::var("FIELDSYNC_AUTO_RELEASE_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.auto_release_interval = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_RECONNECT_DEBOUNCE") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.reconnect_debounce = value;
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_MAX_RETRIES") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.max_retries = value.min(u32::MAX as u64) as u32;
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_STALE_CEILING_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.stale_ceiling_secs = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FIELDSYNC_CACHE_SWEEP_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.sweep_interval_secs = value.max(1);
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.remote.base_url.trim().is_empty() {
            return Err("Remote base_url must not be empty".to_string());
        }
        if self.sync.max_retries == 0 {
            return Err("Sync max_retries must be greater than 0".to_string());
        }
        if self.cache.stale_ceiling_secs <= self.cache.api_fresh_secs {
            return Err("Cache stale ceiling must exceed the fresh window".to_string());
        }
        if self.cache.memory_entries == 0 {
            return Err("Cache memory_entries must be greater than 0".to_string());
        }
        if self.cache.rules.api_prefixes.is_empty() {
            return Err("Cache rules require at least one API prefix".to_string());
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
