pub mod auto_release_service;
pub mod cache_service;
pub mod offline_service;
pub mod scheduler;
pub mod sync_service;

pub use auto_release_service::AutoReleaseService;
pub use cache_service::{CacheService, CacheStats};
pub use offline_service::OfflineService;
pub use scheduler::BackgroundScheduler;
pub use sync_service::{SyncError, SyncOrchestrator};
