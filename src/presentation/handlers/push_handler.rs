use crate::domain::entities::notification::{
    NotificationAction, NotificationActionKind, PushNotification,
};
use crate::infrastructure::messaging::{ForegroundChannel, ForegroundEvent};
use crate::presentation::dto::NotificationActionMessage;
use crate::shared::error::AppError;
use serde_json::Value;
use std::sync::Arc;

/// Receives raw push payloads and notification actions from the host and
/// turns them into canonical domain values.
pub struct PushHandler {
    events: Arc<ForegroundChannel>,
}

impl PushHandler {
    pub fn new(events: Arc<ForegroundChannel>) -> Self {
        Self { events }
    }

    /// Normalize an inbound push payload into the canonical notification
    /// the host should display.
    pub fn deliver(&self, payload: &Value) -> PushNotification {
        let notification = PushNotification::from_payload(payload);
        tracing::debug!(
            target: "fieldsync::push",
            notification_id = %notification.notification_id,
            "push payload normalized"
        );
        notification
    }

    /// A click/dismiss/close on a delivered notification. The stable id
    /// rides back to the foreground so it can mark the item read.
    pub fn action(
        &self,
        message: NotificationActionMessage,
    ) -> Result<NotificationAction, AppError> {
        let kind = NotificationActionKind::parse(&message.action)
            .map_err(AppError::InvalidInput)?;

        let action = NotificationAction {
            kind,
            notification_id: message.notification_id,
        };
        self.events.emit(ForegroundEvent::NotificationAction {
            action: action.kind,
            notification_id: action.notification_id.clone(),
        });
        Ok(action)
    }
}
