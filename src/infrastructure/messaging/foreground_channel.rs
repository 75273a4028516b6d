use crate::domain::entities::notification::NotificationActionKind;
use crate::domain::value_objects::SyncTag;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Everything the background context is allowed to tell the foreground.
/// Advisory, at-most-once-per-event; senders never block on delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForegroundEvent {
    ServedStaleCache {
        url: String,
        cache_age_ms: i64,
    },
    MutationQueued {
        url: String,
        tag: SyncTag,
    },
    MutationSynced {
        url: String,
    },
    SyncCompleted {
        synced: u32,
        failed: u32,
        errors: Vec<String>,
    },
    SyncDeferralUnavailable {
        tag: SyncTag,
    },
    ClaimAutoReleased {
        site_id: String,
        former_assignee: String,
    },
    NotificationAction {
        action: NotificationActionKind,
        notification_id: String,
    },
}

/// Broadcast channel to any listening foreground context. Subscribers come
/// and go freely; an event with no listeners is dropped, never an error on
/// the emitting path.
pub struct ForegroundChannel {
    tx: broadcast::Sender<ForegroundEvent>,
}

impl ForegroundChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ForegroundEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: ForegroundEvent) {
        if let Err(err) = self.tx.send(event) {
            tracing::trace!(target: "fieldsync::events", "no foreground listeners: {err}");
        }
    }
}

impl Default for ForegroundChannel {
    fn default() -> Self {
        Self::new(64)
    }
}
