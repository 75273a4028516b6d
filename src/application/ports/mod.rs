pub mod connectivity;
pub mod http_fetch;
pub mod offline_store;
pub mod remote_api;
pub mod sync_registrar;

pub use connectivity::ConnectivityProbe;
pub use http_fetch::HttpFetch;
pub use offline_store::OfflineStore;
pub use remote_api::{CostSubmission, ReleaseCandidate, RemoteApi, VisitFees};
pub use sync_registrar::SyncRegistrar;
