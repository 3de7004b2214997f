//! View configuration.
//!
//! Defaults carry the fixed map setup. A few knobs can be overridden through the
//! page query string so the same bundle works on device and in the devhost.

use crate::geo::{LatLng, DEFAULT_CENTER, DEFAULT_ZOOM};
use crate::marker::DEFAULT_ICON_FONT_PX;

pub const OSM_TILE_URL: &str = "http://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OSM_MAX_ZOOM: u8 = 10;
pub const OSM_ATTRIBUTION: &str =
    r#"&copy; OSM Mapnik <a href="http://www.openstreetmap.org/copyright">OpenStreetMap</a>"#;

#[derive(Debug, Clone, PartialEq)]
pub struct TileSource {
    pub url: String,
    pub max_zoom: u8,
    pub attribution: String,
}

impl Default for TileSource {
    fn default() -> Self {
        Self {
            url: OSM_TILE_URL.to_string(),
            max_zoom: OSM_MAX_ZOOM,
            attribution: OSM_ATTRIBUTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub show_debug: bool,
    pub center: LatLng,
    pub zoom: f64,
    pub tile: TileSource,
    pub icon_font_px: u32,
    /// How many times the handshake probes for a host channel.
    pub connect_attempts: u32,
    pub connect_interval_ms: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            show_debug: true,
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            tile: TileSource::default(),
            icon_font_px: DEFAULT_ICON_FONT_PX,
            connect_attempts: 50,
            connect_interval_ms: 100,
        }
    }
}

impl MapConfig {
    /// Apply `debug`, `lat`, `lng` and `zoom` overrides from decoded query pairs.
    ///
    /// Unknown keys are ignored. Unparsable values are skipped and returned so
    /// the caller can log them.
    pub fn apply_query<'a, I>(&mut self, pairs: I) -> Vec<String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut rejected = Vec::new();
        for (key, value) in pairs {
            let ok = match key {
                "debug" => parse_flag(value).map(|v| self.show_debug = v).is_some(),
                "lat" => parse_finite(value).map(|v| self.center.lat = v).is_some(),
                "lng" => parse_finite(value).map(|v| self.center.lng = v).is_some(),
                "zoom" => parse_finite(value)
                    .filter(|z| *z >= 0.0)
                    .map(|v| self.zoom = v)
                    .is_some(),
                _ => true,
            };
            if !ok {
                rejected.push(format!("{key}={value}"));
            }
        }
        rejected
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}
