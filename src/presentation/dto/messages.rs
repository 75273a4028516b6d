use crate::domain::value_objects::SyncTag;
use crate::shared::config::CacheRules;
use serde::{Deserialize, Serialize};

/// Inbound message protocol from a foreground context. A fixed union; any
/// other shape is rejected at deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForegroundCommand {
    SetConfig { rules: CacheRules },
    SkipWaiting,
    GetVersion,
    TriggerSync { tag: SyncTag },
    ClearCache { pattern: String },
    InvalidateEntry { url: String },
    GetCacheStats,
    Prefetch { urls: Vec<String> },
}

/// Every command has at most one reply shape. `get_version` and
/// `get_cache_stats` reply synchronously; everything else acknowledges and
/// reports outcomes over the event channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandReply {
    Version {
        version: String,
    },
    CacheStats {
        persisted_entries: u64,
        memory_entries: u64,
    },
    Ack,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_round_trip_through_json() {
        let command = ForegroundCommand::TriggerSync {
            tag: SyncTag::CostSubmissions,
        };
        let json = serde_json::to_string(&command).unwrap();
        assert!(json.contains("trigger_sync"));
        assert!(json.contains("cost-submissions"));

        let parsed: ForegroundCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, command);
    }

    #[test]
    fn arbitrary_shapes_are_rejected() {
        let result =
            serde_json::from_str::<ForegroundCommand>(r#"{"type":"format_disk","target":"/"}"#);
        assert!(result.is_err());
    }
}
