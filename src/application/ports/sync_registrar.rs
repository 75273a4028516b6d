use crate::domain::value_objects::SyncTag;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Deferred background-sync registration with the host platform.
/// Best-effort: callers must fall back to foreground notification when
/// registration fails.
#[async_trait]
pub trait SyncRegistrar: Send + Sync {
    async fn register(&self, tag: SyncTag) -> Result<(), AppError>;
}
