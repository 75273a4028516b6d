use serde::{Deserialize, Serialize};
use std::fmt;

/// Named background-sync registrations. Each tag maps to exactly one
/// foreground handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncTag {
    PendingActions,
    SiteVisits,
    Locations,
    CostSubmissions,
    Notifications,
}

impl SyncTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTag::PendingActions => "pending-actions",
            SyncTag::SiteVisits => "site-visits",
            SyncTag::Locations => "locations",
            SyncTag::CostSubmissions => "cost-submissions",
            SyncTag::Notifications => "notifications",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "pending-actions" => Ok(SyncTag::PendingActions),
            "site-visits" => Ok(SyncTag::SiteVisits),
            "locations" => Ok(SyncTag::Locations),
            "cost-submissions" => Ok(SyncTag::CostSubmissions),
            "notifications" => Ok(SyncTag::Notifications),
            other => Err(format!("Unknown sync tag: {other}")),
        }
    }

    /// Tag used when a mutation to the given API resource path fails and is
    /// registered for background retry.
    pub fn for_resource_path(path: &str) -> Self {
        if path.contains("site_visits") || path.contains("site_entries") {
            SyncTag::SiteVisits
        } else if path.contains("location") || path.contains("profiles") {
            SyncTag::Locations
        } else if path.contains("cost_submissions") {
            SyncTag::CostSubmissions
        } else if path.contains("notifications") {
            SyncTag::Notifications
        } else {
            SyncTag::PendingActions
        }
    }
}

impl fmt::Display for SyncTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips() {
        for tag in [
            SyncTag::PendingActions,
            SyncTag::SiteVisits,
            SyncTag::Locations,
            SyncTag::CostSubmissions,
            SyncTag::Notifications,
        ] {
            assert_eq!(SyncTag::parse(tag.as_str()).unwrap(), tag);
        }
    }

    #[test]
    fn unknown_resources_fall_back_to_pending_actions() {
        assert_eq!(
            SyncTag::for_resource_path("/rest/v1/budgets"),
            SyncTag::PendingActions
        );
        assert_eq!(
            SyncTag::for_resource_path("/rest/v1/cost_submissions"),
            SyncTag::CostSubmissions
        );
    }
}
