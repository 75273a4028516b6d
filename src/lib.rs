//! Offline-first synchronization core for field operations.
//!
//! Three cooperating pieces keep a field device useful with no
//! connectivity: a multi-tier response cache with time-bounded freshness
//! ([`application::services::CacheService`]), a durable SQLite-backed queue
//! of pending mutations ([`application::ports::OfflineStore`]), and a
//! single-flight orchestrator that drains the queue against the remote
//! system of record once connectivity returns
//! ([`application::services::SyncOrchestrator`]). A background scheduler
//! decides when drains run; a typed event channel keeps the foreground
//! informed without ever blocking the response path.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod shared;

mod state;

pub use shared::config::AppConfig;
pub use shared::error::{AppError, Result};
pub use state::SyncCore;

/// Install the global tracing subscriber. Call once, early.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fieldsync=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
