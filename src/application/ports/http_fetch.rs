use crate::domain::entities::{HttpRequest, HttpResponse};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Raw network access for the cache layer. Timeouts are the client's own;
/// a transport failure is an `AppError::Network`, never a panic.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, AppError>;
}
