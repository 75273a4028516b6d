use async_trait::async_trait;
use tokio::sync::watch;

/// Device connectivity as reported by the platform.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;

    /// A watch on the online flag; the scheduler reacts to offline->online
    /// transitions.
    fn subscribe(&self) -> watch::Receiver<bool>;
}
