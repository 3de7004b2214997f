//! Demo marker batches for exercising the webview without a real host app.

use axum::extract::Query;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use webview_map_shared::geo::{LatLng, DEFAULT_CENTER};
use webview_map_shared::marker::{Animation, Marker, MarkerId};

pub const EMOJI: [&str; 7] = ["😴", "😄", "😃", "⛔", "🎠", "🚓", "🚇"];
pub const ANIMATIONS: [&str; 6] = ["bounce", "fade", "pulse", "jump", "waggle", "spin"];

pub const DEFAULT_COUNT: usize = 7;
pub const MAX_COUNT: usize = 200;

/// Ring radius in degrees (roughly 500m at London's latitude).
const RING_RADIUS_DEG: f64 = 0.005;

/// Place `count` markers evenly on a ring around `center`.
///
/// Icons cycle through [`EMOJI`]; every odd marker is animated, cycling through
/// [`ANIMATIONS`]. Ids are fresh v4 UUIDs.
pub fn demo_markers(center: LatLng, count: usize) -> Vec<Marker> {
    (0..count)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / count as f64;
            let coords = LatLng::new(
                center.lat + RING_RADIUS_DEG * angle.sin(),
                center.lng + RING_RADIUS_DEG * angle.cos(),
            );
            let animation = if i % 2 == 1 {
                Animation::parse(ANIMATIONS[(i / 2) % ANIMATIONS.len()])
                    .ok()
                    .flatten()
            } else {
                None
            };
            Marker {
                id: Some(MarkerId(serde_json::Value::String(
                    uuid::Uuid::new_v4().to_string(),
                ))),
                coords,
                icon: EMOJI[i % EMOJI.len()].to_string(),
                animation,
            }
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct DemoQuery {
    pub count: Option<usize>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// `GET /api/demo-markers`: an `UPDATE_MARKERS` payload.
pub async fn demo_markers_handler(
    Query(query): Query<DemoQuery>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let count = query.count.unwrap_or(DEFAULT_COUNT).min(MAX_COUNT);
    let center = LatLng::new(
        query.lat.unwrap_or(DEFAULT_CENTER.lat),
        query.lng.unwrap_or(DEFAULT_CENTER.lng),
    );
    if !center.is_finite() || center.lat.abs() > 90.0 || center.lng.abs() > 180.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("center out of range: {center}"),
        ));
    }

    let markers = demo_markers(center, count);
    tracing::debug!(count = markers.len(), %center, "serving demo markers");
    Ok(Json(serde_json::json!({ "markers": markers })))
}
