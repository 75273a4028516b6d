pub mod client;
pub mod rest_api;

pub use client::ReqwestFetch;
pub use rest_api::RestRemoteApi;
