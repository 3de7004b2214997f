use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::LatLng;

/// CSS class applied to every marker icon container.
pub const ICON_CLASS_NAME: &str = "clearMarkerContainer";

/// CSS class that opts an icon into the keyframe animations.
pub const ANIMATED_CLASS_NAME: &str = "animated-marker";

pub const DEFAULT_ICON_FONT_PX: u32 = 36;

/// Opaque marker identifier chosen by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub serde_json::Value);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// Name of a CSS animation class, e.g. `bounce` or `pulse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Animation(String);

impl Animation {
    /// Parse an animation name. An empty string means "not animated".
    pub fn parse(name: &str) -> Result<Option<Self>, String> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        if name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            Ok(Some(Animation(name.to_string())))
        } else {
            Err(name.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarkerError {
    #[error("marker {index}: entry is not an object")]
    NotAnObject { index: usize },
    #[error("marker {index}: missing coords")]
    MissingCoords { index: usize },
    #[error("marker {index}: invalid coords: {reason}")]
    InvalidCoords { index: usize, reason: String },
    #[error("marker {index}: icon must be a string")]
    InvalidIcon { index: usize },
    #[error("marker {index}: invalid animation name {name:?}")]
    InvalidAnimation { index: usize, name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<MarkerId>,
    pub coords: LatLng,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<Animation>,
}

impl Marker {
    /// Validate one entry of an inbound `UPDATE_MARKERS` payload.
    ///
    /// `index` is the entry's position in the batch and only feeds error messages.
    pub fn from_value(index: usize, value: &serde_json::Value) -> Result<Self, MarkerError> {
        let obj = value
            .as_object()
            .ok_or(MarkerError::NotAnObject { index })?;

        // Only a missing or null id means "no id"; 0, "" and false are kept
        // as host-chosen ids and echoed back on click.
        let id = match obj.get("id") {
            None | Some(serde_json::Value::Null) => None,
            Some(v) => Some(MarkerId(v.clone())),
        };

        let coords = match obj.get("coords") {
            None | Some(serde_json::Value::Null) => {
                return Err(MarkerError::MissingCoords { index })
            }
            Some(v) => serde_json::from_value::<LatLng>(v.clone()).map_err(|e| {
                MarkerError::InvalidCoords {
                    index,
                    reason: e.to_string(),
                }
            })?,
        };
        if !coords.is_finite() {
            return Err(MarkerError::InvalidCoords {
                index,
                reason: "non-finite coordinate".to_string(),
            });
        }

        let icon = match obj.get("icon") {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(_) => return Err(MarkerError::InvalidIcon { index }),
        };

        let animation = match obj.get("animation") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Animation::parse(s)
                .map_err(|name| MarkerError::InvalidAnimation { index, name })?,
            Some(other) => {
                return Err(MarkerError::InvalidAnimation {
                    index,
                    name: other.to_string(),
                })
            }
        };

        Ok(Marker {
            id,
            coords,
            icon,
            animation,
        })
    }

    pub fn icon(&self, font_px: u32) -> DivIcon {
        DivIcon::for_marker(&self.icon, self.animation.as_ref(), font_px)
    }
}

/// HTML-only icon description handed to the map widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivIcon {
    pub class_name: &'static str,
    pub html: String,
}

impl DivIcon {
    pub fn for_marker(icon: &str, animation: Option<&Animation>, font_px: u32) -> Self {
        let text = escape_html(icon);
        let html = match animation {
            Some(anim) => format!(
                "<div class='{ANIMATED_CLASS_NAME} {}' style='font-size: {font_px}px'>{text}</div>",
                anim.as_str()
            ),
            None => format!("<div style='font-size: {font_px}px'>{text}</div>"),
        };
        DivIcon {
            class_name: ICON_CLASS_NAME,
            html,
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
