pub mod cached_response;
pub mod http;
pub mod location_sample;
pub mod notification;
pub mod pending_mutation;
pub mod site_visit;
pub mod sync_report;

pub use cached_response::CachedResponse;
pub use http::{HttpRequest, HttpResponse, ServedResponse, CACHED_AT_HEADER, QUEUED_HEADER};
pub use location_sample::{LocationDraft, LocationSample};
pub use notification::{NotificationAction, NotificationActionKind, PushNotification};
pub use pending_mutation::{
    CostSubmissionPayload, LocationUpdatePayload, MutationDraft, PendingMutation,
    PhotoUploadPayload, VisitCompletePayload, VisitStartPayload,
};
pub use site_visit::{SiteVisitDraft, SiteVisitRecord, VisitStatus};
pub use sync_report::{AutoReleaseReport, OfflineStats, SyncPhase, SyncProgress, SyncReport};
