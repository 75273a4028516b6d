use crate::domain::value_objects::ResponseSource;
use bytes::Bytes;

/// Header carrying the cache-write timestamp (unix milliseconds). This
/// header is the sole staleness mechanism and must round-trip through the
/// cache storage byte-exact.
pub const CACHED_AT_HEADER: &str = "x-fieldsync-cached-at";

/// Header marking a synthetic 503 whose mutation was accepted for later
/// delivery.
pub const QUEUED_HEADER: &str = "x-fieldsync-queued";

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_read(&self) -> bool {
        matches!(self.method.to_ascii_uppercase().as_str(), "GET" | "HEAD")
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_header(&mut self, name: &str, value: String) {
        if let Some(entry) = self
            .headers
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            entry.1 = value;
        } else {
            self.headers.push((name.to_string(), value));
        }
    }

    /// Synthetic 503 returned when neither network nor cache can answer.
    pub fn service_unavailable() -> Self {
        Self {
            status: 503,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Bytes::from_static(b"{\"error\":\"offline\"}"),
        }
    }

    /// Synthetic 503 for a mutation accepted for later delivery.
    pub fn queued() -> Self {
        let mut response = Self::service_unavailable();
        response.set_header(QUEUED_HEADER, "true".to_string());
        response.body = Bytes::from_static(b"{\"error\":\"offline\",\"queued\":true}");
        response
    }
}

/// What the cache layer hands back to the caller: always a response, plus
/// provenance the UI can disclose.
#[derive(Debug, Clone)]
pub struct ServedResponse {
    pub response: HttpResponse,
    pub source: ResponseSource,
    pub cache_age_ms: Option<i64>,
    pub queued: bool,
}

impl ServedResponse {
    pub fn network(response: HttpResponse) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
            cache_age_ms: None,
            queued: false,
        }
    }

    pub fn cached(response: HttpResponse, age_ms: i64) -> Self {
        Self {
            response,
            source: ResponseSource::Cache,
            cache_age_ms: Some(age_ms),
            queued: false,
        }
    }

    pub fn stale(response: HttpResponse, age_ms: i64) -> Self {
        Self {
            response,
            source: ResponseSource::StaleCache,
            cache_age_ms: Some(age_ms),
            queued: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            response: HttpResponse::service_unavailable(),
            source: ResponseSource::Synthetic,
            cache_age_ms: None,
            queued: false,
        }
    }

    pub fn accepted_for_retry() -> Self {
        Self {
            response: HttpResponse::queued(),
            source: ResponseSource::Synthetic,
            cache_age_ms: None,
            queued: true,
        }
    }
}
