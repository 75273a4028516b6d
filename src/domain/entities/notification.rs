use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Canonical notification produced from the wire payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushNotification {
    pub notification_id: String,
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub data: Value,
}

impl PushNotification {
    /// Normalize an inbound push payload. Fields are looked up in order:
    /// top level, then `notification`, then `data` — the order encodes the
    /// payload variance observed in the wild and must not be changed.
    pub fn from_payload(payload: &Value) -> Self {
        let notification_id = lookup(payload, "notificationId")
            .or_else(|| lookup(payload, "notification_id"))
            .or_else(|| lookup(payload, "id"))
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let title = lookup(payload, "title").unwrap_or_else(|| "Notification".to_string());
        let body = lookup(payload, "body").unwrap_or_default();
        let icon = lookup(payload, "icon");

        let data = payload
            .get("data")
            .cloned()
            .unwrap_or(Value::Null);

        Self {
            notification_id,
            title,
            body,
            icon,
            data,
        }
    }
}

fn lookup(payload: &Value, field: &str) -> Option<String> {
    for scope in [Some(payload), payload.get("notification"), payload.get("data")] {
        if let Some(value) = scope.and_then(|v| v.get(field)) {
            match value {
                Value::String(s) if !s.is_empty() => return Some(s.clone()),
                Value::Number(n) => return Some(n.to_string()),
                _ => {}
            }
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationActionKind {
    Clicked,
    Dismissed,
    Closed,
}

impl NotificationActionKind {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "clicked" | "click" => Ok(NotificationActionKind::Clicked),
            "dismissed" | "dismiss" => Ok(NotificationActionKind::Dismissed),
            "closed" | "close" => Ok(NotificationActionKind::Closed),
            other => Err(format!("Unknown notification action: {other}")),
        }
    }
}

/// A user action on a delivered notification, carrying the stable id back
/// to the foreground so the originating item can be marked read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationAction {
    pub kind: NotificationActionKind,
    pub notification_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn top_level_fields_win() {
        let payload = json!({
            "notificationId": "n-1",
            "title": "Top",
            "body": "top body",
            "notification": { "title": "Nested", "body": "nested body" },
            "data": { "title": "Data" }
        });

        let normalized = PushNotification::from_payload(&payload);
        assert_eq!(normalized.title, "Top");
        assert_eq!(normalized.body, "top body");
        assert_eq!(normalized.notification_id, "n-1");
    }

    #[test]
    fn nested_notification_block_is_second_choice() {
        let payload = json!({
            "notification": { "title": "Nested", "body": "nested body", "icon": "/i.png" },
            "data": { "title": "Data" }
        });

        let normalized = PushNotification::from_payload(&payload);
        assert_eq!(normalized.title, "Nested");
        assert_eq!(normalized.icon.as_deref(), Some("/i.png"));
    }

    #[test]
    fn data_block_is_the_last_fallback() {
        let payload = json!({
            "data": { "title": "Data", "body": "data body", "notificationId": "n-9" }
        });

        let normalized = PushNotification::from_payload(&payload);
        assert_eq!(normalized.title, "Data");
        assert_eq!(normalized.body, "data body");
        assert_eq!(normalized.notification_id, "n-9");
    }

    #[test]
    fn missing_id_gets_a_generated_one() {
        let normalized = PushNotification::from_payload(&json!({ "title": "T" }));
        assert!(!normalized.notification_id.is_empty());
    }
}
