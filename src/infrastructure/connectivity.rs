use crate::application::ports::connectivity::ConnectivityProbe;
use async_trait::async_trait;
use tokio::sync::watch;

/// Connectivity state fed by the host platform (or by tests). The scheduler
/// watches the receiver side for offline->online transitions.
pub struct WatchConnectivity {
    tx: watch::Sender<bool>,
}

impl WatchConnectivity {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _) = watch::channel(initially_online);
        Self { tx }
    }

    pub fn set_online(&self, online: bool) {
        // send_replace never fails; the sender keeps its own receiver alive.
        self.tx.send_replace(online);
    }
}

#[async_trait]
impl ConnectivityProbe for WatchConnectivity {
    async fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transitions_are_observable() {
        let connectivity = WatchConnectivity::new(false);
        let mut rx = connectivity.subscribe();

        assert!(!connectivity.is_online().await);
        connectivity.set_online(true);

        rx.changed().await.expect("change notification");
        assert!(*rx.borrow());
        assert!(connectivity.is_online().await);
    }
}
