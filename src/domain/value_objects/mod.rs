pub mod cache;
pub mod geo;
pub mod mutation;
pub mod sync_tag;

pub use cache::{CacheKey, CacheTier, FetchStrategy, ResponseSource};
pub use geo::GeoPoint;
pub use mutation::{MutationId, MutationKind, MutationStatus};
pub use sync_tag::SyncTag;
