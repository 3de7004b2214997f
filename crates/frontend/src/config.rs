use dioxus::logger::tracing;
use webview_map_shared::config::MapConfig;

/// Query keys the page accepts as overrides.
const QUERY_KEYS: [&str; 4] = ["debug", "lat", "lng", "zoom"];

/// Build the view configuration from defaults plus the page query string.
pub fn load() -> MapConfig {
    let mut config = MapConfig::default();
    let Some(search) = web_sys::window().and_then(|w| w.location().search().ok()) else {
        return config;
    };
    let Ok(params) = web_sys::UrlSearchParams::new_with_str(&search) else {
        return config;
    };

    let pairs: Vec<(&str, String)> = QUERY_KEYS
        .iter()
        .filter_map(|key| params.get(key).map(|value| (*key, value)))
        .collect();
    for rejected in config.apply_query(pairs.iter().map(|(k, v)| (*k, v.as_str()))) {
        tracing::warn!("ignoring invalid query override {rejected}");
    }
    config
}
