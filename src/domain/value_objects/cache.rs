use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Request identity for the response cache: a digest over method and URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(value: String) -> Result<Self, String> {
        if value.trim().is_empty() {
            return Err("Cache key must not be empty".to_string());
        }
        Ok(Self(value))
    }

    pub fn from_request(method: &str, url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(method.to_ascii_uppercase().as_bytes());
        hasher.update(b" ");
        hasher.update(url.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage tier a cached response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheTier {
    StaticAssets,
    ApiReads,
    Dynamic,
}

impl CacheTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTier::StaticAssets => "static_assets",
            CacheTier::ApiReads => "api_reads",
            CacheTier::Dynamic => "dynamic",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "static_assets" => Ok(CacheTier::StaticAssets),
            "api_reads" => Ok(CacheTier::ApiReads),
            "dynamic" => Ok(CacheTier::Dynamic),
            other => Err(format!("Unknown cache tier: {other}")),
        }
    }
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    StaleCache,
    Synthetic,
}

/// Outcome of classifying an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    NavigationFallback,
    NetworkFirst,
    MutationPassThrough,
    CacheFirst,
    StaleWhileRevalidate,
    Bypass,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_stable_for_same_request() {
        let a = CacheKey::from_request("get", "https://api.example.org/rest/v1/sites");
        let b = CacheKey::from_request("GET", "https://api.example.org/rest/v1/sites");
        assert_eq!(a, b);
    }

    #[test]
    fn key_differs_by_method() {
        let read = CacheKey::from_request("GET", "https://api.example.org/rest/v1/sites");
        let write = CacheKey::from_request("POST", "https://api.example.org/rest/v1/sites");
        assert_ne!(read, write);
    }
}
