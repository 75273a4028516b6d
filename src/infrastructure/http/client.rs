use crate::application::ports::http_fetch::HttpFetch;
use crate::domain::entities::{HttpRequest, HttpResponse};
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::time::Duration;

/// Network access through a shared reqwest client. Per-request timeouts are
/// the client's own; the cache layer never adds its own deadline.
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    pub fn new(timeout_secs: u64) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, AppError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| AppError::InvalidInput(format!("Invalid HTTP method: {}", request.method)))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
