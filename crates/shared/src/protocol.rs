//! Bridge wire format.
//!
//! Every message is a JSON text envelope `{"type": "<EVENT>", "payload": ...}`.
//! Inbound events come from the host, outbound events go to it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::LatLng;
use crate::marker::MarkerId;

/// Fixed payload announced with `WEBVIEW_READY`.
pub const READY_PAYLOAD: &str = "hello";

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("message is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message has no string \"type\" field")]
    MissingType,
    #[error("unknown event type {0:?}")]
    UnknownEvent(String),
    #[error("invalid payload for {event}: {source}")]
    Payload {
        event: &'static str,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterChange {
    pub map_center_coords: LatLng,
}

/// `UPDATE_MARKERS` payload. Entries stay raw so each one can be validated on
/// its own and a single bad entry does not sink the batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarkerUpdate {
    pub markers: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugToggle {
    pub show_debug: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    MapCenterCoordChange(CenterChange),
    UpdateMarkers(MarkerUpdate),
    SetDebug(DebugToggle),
}

impl InboundEvent {
    pub const MAP_CENTER_COORD_CHANGE: &'static str = "MAP_CENTER_COORD_CHANGE";
    pub const UPDATE_MARKERS: &'static str = "UPDATE_MARKERS";
    pub const SET_DEBUG: &'static str = "SET_DEBUG";

    /// Decode one inbound envelope.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let mut envelope: serde_json::Value = serde_json::from_str(text)?;
        let event_type = envelope
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or(ProtocolError::MissingType)?
            .to_string();
        let payload = envelope
            .get_mut("payload")
            .map(serde_json::Value::take)
            .unwrap_or(serde_json::Value::Null);

        match event_type.as_str() {
            Self::MAP_CENTER_COORD_CHANGE => payload_as(Self::MAP_CENTER_COORD_CHANGE, payload)
                .map(InboundEvent::MapCenterCoordChange),
            Self::UPDATE_MARKERS => {
                payload_as(Self::UPDATE_MARKERS, payload).map(InboundEvent::UpdateMarkers)
            }
            Self::SET_DEBUG => payload_as(Self::SET_DEBUG, payload).map(InboundEvent::SetDebug),
            _ => Err(ProtocolError::UnknownEvent(event_type)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::MapCenterCoordChange(_) => Self::MAP_CENTER_COORD_CHANGE,
            InboundEvent::UpdateMarkers(_) => Self::UPDATE_MARKERS,
            InboundEvent::SetDebug(_) => Self::SET_DEBUG,
        }
    }
}

fn payload_as<T: for<'de> Deserialize<'de>>(
    event: &'static str,
    payload: serde_json::Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(payload).map_err(|source| ProtocolError::Payload { event, source })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundEvent {
    WebviewReady(String),
    MapClicked { coords: LatLng },
    MarkerClicked { id: Option<MarkerId> },
}

impl OutboundEvent {
    pub fn ready() -> Self {
        OutboundEvent::WebviewReady(READY_PAYLOAD.to_string())
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::WebviewReady(_) => "WEBVIEW_READY",
            OutboundEvent::MapClicked { .. } => "MAP_CLICKED",
            OutboundEvent::MarkerClicked { .. } => "MARKER_CLICKED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_center_change() {
        let text = r#"{"type":"MAP_CENTER_COORD_CHANGE","payload":{"mapCenterCoords":{"lat":40.7,"lng":-74.0}}}"#;
        let event = InboundEvent::decode(text).unwrap();
        assert_eq!(
            event,
            InboundEvent::MapCenterCoordChange(CenterChange {
                map_center_coords: LatLng::new(40.7, -74.0)
            })
        );
        assert_eq!(event.name(), "MAP_CENTER_COORD_CHANGE");
    }

    #[test]
    fn test_decode_center_change_array_coords() {
        let text = r#"{"type":"MAP_CENTER_COORD_CHANGE","payload":{"mapCenterCoords":[1.0,2.0]}}"#;
        match InboundEvent::decode(text).unwrap() {
            InboundEvent::MapCenterCoordChange(c) => {
                assert_eq!(c.map_center_coords, LatLng::new(1.0, 2.0))
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_decode_update_markers_keeps_raw_entries() {
        let text = r#"{"type":"UPDATE_MARKERS","payload":{"markers":[{"id":1},{"coords":[0,0]}]}}"#;
        match InboundEvent::decode(text).unwrap() {
            InboundEvent::UpdateMarkers(update) => {
                assert_eq!(update.markers.len(), 2);
                assert_eq!(update.markers[0], json!({"id": 1}));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_decode_set_debug() {
        let text = r#"{"type":"SET_DEBUG","payload":{"showDebug":false}}"#;
        assert_eq!(
            InboundEvent::decode(text).unwrap(),
            InboundEvent::SetDebug(DebugToggle { show_debug: false })
        );
    }

    #[test]
    fn test_decode_unknown_event() {
        let err = InboundEvent::decode(r#"{"type":"PAYMENT_STATUS","payload":{}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownEvent(t) if t == "PAYMENT_STATUS"));
    }

    #[test]
    fn test_decode_missing_type() {
        let err = InboundEvent::decode(r#"{"payload":{}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingType));
    }

    #[test]
    fn test_decode_bad_json() {
        assert!(matches!(
            InboundEvent::decode("not json").unwrap_err(),
            ProtocolError::Json(_)
        ));
    }

    #[test]
    fn test_decode_missing_payload() {
        let err = InboundEvent::decode(r#"{"type":"UPDATE_MARKERS"}"#).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Payload {
                event: "UPDATE_MARKERS",
                ..
            }
        ));
    }

    #[test]
    fn test_encode_ready() {
        let value: serde_json::Value =
            serde_json::from_str(&OutboundEvent::ready().encode().unwrap()).unwrap();
        assert_eq!(value, json!({"type": "WEBVIEW_READY", "payload": "hello"}));
    }

    #[test]
    fn test_encode_map_clicked() {
        let event = OutboundEvent::MapClicked {
            coords: LatLng::new(51.5, -0.09),
        };
        let value: serde_json::Value = serde_json::from_str(&event.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "MAP_CLICKED", "payload": {"coords": {"lat": 51.5, "lng": -0.09}}})
        );
    }

    #[test]
    fn test_encode_marker_clicked_null_id() {
        let event = OutboundEvent::MarkerClicked { id: None };
        let value: serde_json::Value = serde_json::from_str(&event.encode().unwrap()).unwrap();
        assert_eq!(value, json!({"type": "MARKER_CLICKED", "payload": {"id": null}}));
        assert_eq!(event.name(), "MARKER_CLICKED");
    }
}
