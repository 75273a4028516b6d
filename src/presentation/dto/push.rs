use serde::{Deserialize, Serialize};

/// Wire shape of a user action on a delivered notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationActionMessage {
    pub action: String,
    pub notification_id: String,
}
