//! Geographic coordinates exchanged with the host and the map widget.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Default map centre (central London).
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 51.5,
    lng: -0.09,
};

pub const DEFAULT_ZOOM: f64 = 15.0;

/// A WGS84 latitude/longitude pair.
///
/// Always serialized as `{"lat": .., "lng": ..}`. Deserialization also accepts
/// the `[lat, lng]` array form that hosts commonly send.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LatLng({}, {})", self.lat, self.lng)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LatLngRepr {
    Pair([f64; 2]),
    Object { lat: f64, lng: f64 },
}

impl<'de> Deserialize<'de> for LatLng {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (lat, lng) = match LatLngRepr::deserialize(deserializer)? {
            LatLngRepr::Pair([lat, lng]) => (lat, lng),
            LatLngRepr::Object { lat, lng } => (lat, lng),
        };
        Ok(LatLng { lat, lng })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_object_form() {
        let ll: LatLng = serde_json::from_value(json!({"lat": 51.5, "lng": -0.09})).unwrap();
        assert_eq!(ll, LatLng::new(51.5, -0.09));
    }

    #[test]
    fn test_deserialize_array_form() {
        let ll: LatLng = serde_json::from_value(json!([48.85, 2.35])).unwrap();
        assert_eq!(ll, LatLng::new(48.85, 2.35));
    }

    #[test]
    fn test_deserialize_rejects_short_array() {
        assert!(serde_json::from_value::<LatLng>(json!([48.85])).is_err());
    }

    #[test]
    fn test_deserialize_rejects_missing_lng() {
        assert!(serde_json::from_value::<LatLng>(json!({"lat": 1.0})).is_err());
    }

    #[test]
    fn test_serializes_as_object() {
        let value = serde_json::to_value(LatLng::new(1.5, 2.5)).unwrap();
        assert_eq!(value, json!({"lat": 1.5, "lng": 2.5}));
    }

    #[test]
    fn test_display_matches_leaflet_format() {
        assert_eq!(LatLng::new(51.5, -0.09).to_string(), "LatLng(51.5, -0.09)");
    }

    #[test]
    fn test_is_finite() {
        assert!(DEFAULT_CENTER.is_finite());
        assert!(!LatLng::new(f64::NAN, 0.0).is_finite());
    }
}
