use serde::{Deserialize, Serialize};

/// A GPS fix as captured on the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64, accuracy: Option<f64>) -> Self {
        Self { lat, lng, accuracy }
    }
}
