//! Leaflet bindings and the Leaflet-backed map widget.
//!
//! Leaflet is loaded as a global `L` by the page (see `Dioxus.toml`).

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use webview_map_shared::config::TileSource;
use webview_map_shared::geo::LatLng;
use webview_map_shared::map::{MapOptions, MapWidget, MarkerSpec, WidgetError};
use webview_map_shared::marker::DivIcon;
use webview_map_shared::view::UiEvent;

#[wasm_bindgen]
extern "C" {
    pub type Evented;

    #[wasm_bindgen(method)]
    fn on(this: &Evented, event: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method)]
    fn off(this: &Evented, event: &str);

    #[wasm_bindgen(extends = Evented, js_name = Map)]
    pub type LeafletMap;

    #[wasm_bindgen(catch, js_namespace = L, js_name = map)]
    fn new_map(container_id: &str, options: &JsValue) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(method, catch, js_name = flyTo)]
    fn fly_to(this: &LeafletMap, latlng: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = addLayer)]
    fn add_layer(this: &LeafletMap, layer: &Layer) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = removeLayer)]
    fn remove_layer(this: &LeafletMap, layer: &Layer) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn remove(this: &LeafletMap) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(extends = Evented)]
    pub type Layer;

    #[wasm_bindgen(method, catch, js_name = addTo)]
    fn add_to(this: &Layer, map: &LeafletMap) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(extends = Layer)]
    pub type TileLayer;

    #[wasm_bindgen(catch, js_namespace = L, js_name = tileLayer)]
    fn new_tile_layer(url: &str, options: &JsValue) -> Result<TileLayer, JsValue>;

    #[wasm_bindgen(catch, js_namespace = L, js_name = divIcon)]
    fn new_div_icon(options: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(extends = Layer, js_name = Marker)]
    pub type LeafletMarker;

    #[wasm_bindgen(catch, js_namespace = L, js_name = marker)]
    fn new_marker(latlng: &JsValue, options: &JsValue) -> Result<LeafletMarker, JsValue>;

    #[wasm_bindgen(extends = Layer)]
    pub type LayerGroup;

    #[wasm_bindgen(catch, js_namespace = L, js_name = layerGroup)]
    fn new_layer_group(layers: &js_sys::Array) -> Result<LayerGroup, JsValue>;

    pub type LeafletMouseEvent;

    #[wasm_bindgen(method, getter)]
    fn latlng(this: &LeafletMouseEvent) -> JsLatLng;

    pub type JsLatLng;

    #[wasm_bindgen(method, getter)]
    fn lat(this: &JsLatLng) -> f64;

    #[wasm_bindgen(method, getter)]
    fn lng(this: &JsLatLng) -> f64;
}

// --- Option builders (pure, testable without a browser) ---

fn map_options(options: &MapOptions) -> serde_json::Value {
    serde_json::json!({
        "center": [options.center.lat, options.center.lng],
        "zoom": options.zoom,
    })
}

fn tile_options(tile: &TileSource) -> serde_json::Value {
    serde_json::json!({
        "maxZoom": tile.max_zoom,
        "attribution": tile.attribution,
    })
}

fn icon_options(icon: &DivIcon) -> serde_json::Value {
    serde_json::json!({
        "iconSize": null,
        "className": icon.class_name,
        "html": icon.html,
    })
}

fn latlng_array(coords: LatLng) -> serde_json::Value {
    serde_json::json!([coords.lat, coords.lng])
}

// --- JS interop helpers ---

fn to_js(value: &serde_json::Value) -> Result<JsValue, WidgetError> {
    js_sys::JSON::parse(&value.to_string()).map_err(js_error)
}

fn js_error(err: JsValue) -> WidgetError {
    let message = err
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    WidgetError(message)
}

pub struct Marker {
    marker: LeafletMarker,
    on_click: Closure<dyn FnMut()>,
}

/// A marker layer attached to the map. Owns the marker click handlers.
pub struct MarkerLayer {
    group: LayerGroup,
    _on_click: Vec<Closure<dyn FnMut()>>,
}

pub struct LeafletWidget {
    container_id: String,
    sink: Rc<dyn Fn(UiEvent)>,
    map: Option<LeafletMap>,
    on_map_click: Option<Closure<dyn FnMut(LeafletMouseEvent)>>,
}

impl LeafletWidget {
    /// `sink` receives map and marker clicks.
    pub fn new(container_id: impl Into<String>, sink: Rc<dyn Fn(UiEvent)>) -> Self {
        Self {
            container_id: container_id.into(),
            sink,
            map: None,
            on_map_click: None,
        }
    }

    fn map(&self) -> Result<&LeafletMap, WidgetError> {
        self.map
            .as_ref()
            .ok_or_else(|| WidgetError("leaflet map not created".to_string()))
    }
}

impl MapWidget for LeafletWidget {
    type Marker = Marker;
    type Layer = MarkerLayer;

    fn init(&mut self, options: &MapOptions) -> Result<(), WidgetError> {
        let map = new_map(&self.container_id, &to_js(&map_options(options))?).map_err(js_error)?;

        let tiles = new_tile_layer(&options.tile.url, &to_js(&tile_options(&options.tile))?)
            .map_err(js_error)?;
        tiles.add_to(&map).map_err(js_error)?;

        let sink = self.sink.clone();
        let on_click = Closure::<dyn FnMut(LeafletMouseEvent)>::new(move |e: LeafletMouseEvent| {
            let ll = e.latlng();
            sink(UiEvent::MapClick(LatLng::new(ll.lat(), ll.lng())));
        });
        map.on("click", on_click.as_ref().unchecked_ref());

        self.map = Some(map);
        self.on_map_click = Some(on_click);
        Ok(())
    }

    fn fly_to(&mut self, coords: LatLng) -> Result<(), WidgetError> {
        let target = to_js(&latlng_array(coords))?;
        self.map()?.fly_to(&target).map_err(js_error)?;
        Ok(())
    }

    fn create_marker(&mut self, spec: &MarkerSpec) -> Result<Marker, WidgetError> {
        let icon = new_div_icon(&to_js(&icon_options(&spec.icon))?).map_err(js_error)?;
        let options = js_sys::Object::new();
        js_sys::Reflect::set(&options, &JsValue::from_str("icon"), &icon).map_err(js_error)?;

        let marker = new_marker(&to_js(&latlng_array(spec.coords))?, &options).map_err(js_error)?;

        let sink = self.sink.clone();
        let id = spec.id.clone();
        let on_click = Closure::<dyn FnMut()>::new(move || {
            sink(UiEvent::MarkerClick(id.clone()));
        });
        marker.on("click", on_click.as_ref().unchecked_ref());

        Ok(Marker { marker, on_click })
    }

    fn add_layer(&mut self, markers: Vec<Marker>) -> Result<MarkerLayer, WidgetError> {
        let layers = js_sys::Array::new();
        let mut handlers = Vec::with_capacity(markers.len());
        for Marker { marker, on_click } in markers {
            layers.push(&marker);
            handlers.push(on_click);
        }
        let group = new_layer_group(&layers).map_err(js_error)?;
        self.map()?.add_layer(&group).map_err(js_error)?;
        Ok(MarkerLayer {
            group,
            _on_click: handlers,
        })
    }

    fn remove_layer(&mut self, layer: &MarkerLayer) -> Result<(), WidgetError> {
        self.map()?.remove_layer(&layer.group).map_err(js_error)?;
        Ok(())
    }

    fn destroy(&mut self) {
        if let Some(map) = self.map.take() {
            map.off("click");
            if let Err(e) = map.remove() {
                dioxus::logger::tracing::warn!("error removing map: {}", js_error(e));
            }
        }
        self.on_map_click = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use webview_map_shared::config::MapConfig;
    use webview_map_shared::marker::Animation;

    #[test]
    fn test_map_options_use_array_center() {
        let config = MapConfig::default();
        let options = MapOptions {
            center: config.center,
            zoom: config.zoom,
            tile: config.tile,
        };
        assert_eq!(map_options(&options), json!({"center": [51.5, -0.09], "zoom": 15.0}));
    }

    #[test]
    fn test_tile_options() {
        let value = tile_options(&TileSource::default());
        assert_eq!(value["maxZoom"], 10);
        assert!(value["attribution"]
            .as_str()
            .unwrap()
            .contains("openstreetmap.org/copyright"));
    }

    #[test]
    fn test_icon_options_have_null_size() {
        let anim = Animation::parse("bounce").unwrap();
        let icon = DivIcon::for_marker("🚇", anim.as_ref(), 36);
        let value = icon_options(&icon);
        assert_eq!(value["iconSize"], serde_json::Value::Null);
        assert_eq!(value["className"], "clearMarkerContainer");
        assert_eq!(
            value["html"],
            "<div class='animated-marker bounce' style='font-size: 36px'>🚇</div>"
        );
    }

    #[test]
    fn test_latlng_array_order() {
        assert_eq!(latlng_array(LatLng::new(1.0, 2.0)), json!([1.0, 2.0]));
    }
}
