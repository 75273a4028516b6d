use crate::domain::entities::http::{HttpResponse, CACHED_AT_HEADER};
use crate::domain::value_objects::{CacheKey, CacheTier};
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};

/// A cached network response keyed by request identity. TTL is fixed at
/// write time; reads never renew it.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub key: CacheKey,
    pub tier: CacheTier,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Snapshot a response into the given tier, stamping the write-time
    /// header that later drives staleness computation.
    pub fn from_response(
        key: CacheKey,
        tier: CacheTier,
        url: String,
        response: &HttpResponse,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let mut headers = response.headers.clone();
        headers.retain(|(name, _)| !name.eq_ignore_ascii_case(CACHED_AT_HEADER));
        headers.push((CACHED_AT_HEADER.to_string(), now.timestamp_millis().to_string()));

        Self {
            key,
            tier,
            url,
            status: response.status,
            headers,
            body: response.body.clone(),
            cached_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn to_response(&self) -> HttpResponse {
        HttpResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    /// Age in milliseconds, computed from the stamped header when present
    /// (the header is authoritative), falling back to the stored column.
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        let written = self
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(CACHED_AT_HEADER))
            .and_then(|(_, value)| value.parse::<i64>().ok())
            .unwrap_or_else(|| self.cached_at.timestamp_millis());
        now.timestamp_millis() - written
    }

    /// An entry at exactly its expiry instant is already expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
