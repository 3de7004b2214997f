//! The map view session: ties the bridge, the map controller and the debug
//! console together. Platform glue feeds it host messages and UI gestures.

use crate::bridge::{Bridge, BridgeError, Transport};
use crate::config::MapConfig;
use crate::console::DebugConsole;
use crate::geo::LatLng;
use crate::map::{MapController, MapError, MapOptions, MapPhase, MapWidget};
use crate::marker::{Marker, MarkerId};
use crate::protocol::{InboundEvent, OutboundEvent};

/// Gestures reported by the map widget.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    MapClick(LatLng),
    MarkerClick(Option<MarkerId>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub show_debug: bool,
    /// Host-owned value; kept opaque.
    pub current_payment_status: Option<serde_json::Value>,
    pub markers: Vec<Marker>,
    pub map_center_coords: Option<LatLng>,
}

pub struct MapView<W: MapWidget, T: Transport> {
    config: MapConfig,
    state: ViewState,
    console: DebugConsole,
    bridge: Bridge<T>,
    map: MapController<W>,
    /// Bumped on every change the UI needs to re-render.
    revision: u64,
}

impl<W: MapWidget, T: Transport> MapView<W, T> {
    pub fn new(config: MapConfig, widget: W) -> Self {
        let map = MapController::new(widget, config.icon_font_px);
        Self {
            state: ViewState {
                show_debug: config.show_debug,
                ..Default::default()
            },
            console: DebugConsole::new(config.show_debug),
            bridge: Bridge::default(),
            map,
            config,
            revision: 0,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn console(&self) -> &DebugConsole {
        &self.console
    }

    pub fn map(&self) -> &MapController<W> {
        &self.map
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_connected(&self) -> bool {
        self.bridge.is_connected()
    }

    pub fn log(&mut self, text: impl Into<String>) {
        if self.console.log_text(text) {
            self.revision += 1;
        }
    }

    /// Create the map widget. `Uninitialized -> Initialized`.
    pub fn mount(&mut self) -> Result<(), MapError> {
        self.log("map view mounted");
        let options = MapOptions {
            center: self.config.center,
            zoom: self.config.zoom,
            tile: self.config.tile.clone(),
        };
        let result = self.map.mount(&options);
        if let Err(e) = &result {
            tracing::error!("map mount failed: {e}");
            self.log(format!("map mount failed: {e}"));
        }
        result
    }

    /// The handshake succeeded: keep the handle and announce readiness.
    pub fn connected(&mut self, transport: T) {
        if !self.bridge.attach(transport) {
            tracing::warn!("bridge already connected, ignoring second handle");
            return;
        }
        tracing::info!("remote connected");
        self.log("remote connected");
        self.emit(OutboundEvent::ready());
    }

    pub fn connection_failed(&mut self, error: &BridgeError) {
        tracing::error!("remote connect error {error}");
        self.log(format!("remote connect error {error}"));
    }

    /// Decode and apply one inbound message. Bad messages are logged and dropped.
    pub fn handle_message(&mut self, text: &str) {
        match InboundEvent::decode(text) {
            Ok(event) => self.handle_event(event),
            Err(e) => {
                tracing::warn!("dropping bridge message: {e}");
                self.log(format!("dropping bridge message: {e}"));
            }
        }
    }

    pub fn handle_event(&mut self, event: InboundEvent) {
        tracing::debug!("inbound {}", event.name());
        match event {
            InboundEvent::MapCenterCoordChange(change) => {
                self.center_on(change.map_center_coords)
            }
            InboundEvent::UpdateMarkers(update) => {
                self.update_markers(&update.markers);
            }
            InboundEvent::SetDebug(toggle) => self.set_debug(toggle.show_debug),
        }
    }

    pub fn handle_ui(&mut self, event: UiEvent) {
        match event {
            UiEvent::MapClick(coords) => {
                self.log(format!("map clicked {coords}"));
                self.emit(OutboundEvent::MapClicked { coords });
            }
            UiEvent::MarkerClick(id) => {
                let label = id
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "null".to_string());
                self.log(format!("marker clicked {label}"));
                self.emit(OutboundEvent::MarkerClicked { id });
            }
        }
    }

    fn center_on(&mut self, coords: LatLng) {
        self.state.map_center_coords = Some(coords);
        self.revision += 1;
        if let Err(e) = self.map.fly_to(coords) {
            tracing::warn!("error panning map: {e}");
            self.log(format!("error panning map: {e}"));
        }
    }

    fn update_markers(&mut self, entries: &[serde_json::Value]) {
        match self.map.update_markers(entries, &mut self.console) {
            Ok((markers, report)) => {
                tracing::info!(
                    rendered = report.rendered,
                    failed = report.failures.len(),
                    "marker layer rebuilt"
                );
                self.state.markers = markers;
                self.revision += 1;
            }
            Err(e) => {
                tracing::error!("error updating markers: {e}");
                self.log(format!("error updating markers: {e}"));
            }
        }
    }

    fn set_debug(&mut self, show: bool) {
        self.state.show_debug = show;
        self.console.set_enabled(show);
        self.revision += 1;
    }

    fn emit(&mut self, event: OutboundEvent) {
        if let Err(e) = self.bridge.emit(&event) {
            tracing::warn!("failed to emit {}: {e}", event.name());
            self.log(format!("failed to emit {}: {e}", event.name()));
        }
    }

    /// Release the bridge handle and the map widget.
    pub fn unmount(&mut self) {
        self.bridge.detach();
        if self.map.phase() != MapPhase::Uninitialized {
            self.map.unmount();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::RecordingTransport;
    use crate::map::testing::FakeWidget;
    use crate::console::LogEntry;
    use crate::map::BuildError;
    use crate::marker::MarkerError;
    use serde_json::json;

    type TestView = MapView<FakeWidget, RecordingTransport>;

    fn mounted_view() -> TestView {
        let mut view = MapView::new(MapConfig::default(), FakeWidget::default());
        view.mount().unwrap();
        view
    }

    fn connected_view() -> (TestView, RecordingTransport) {
        let mut view = mounted_view();
        let transport = RecordingTransport::default();
        view.connected(transport.clone());
        (view, transport)
    }

    #[test]
    fn test_ready_emitted_once_after_connect() {
        let (view, transport) = connected_view();
        assert!(view.is_connected());
        assert_eq!(
            *transport.sent.borrow(),
            vec![json!({"type": "WEBVIEW_READY", "payload": "hello"})]
        );
    }

    #[test]
    fn test_ready_not_emitted_on_failure() {
        let mut view = mounted_view();
        view.connection_failed(&BridgeError::Unavailable { attempts: 3 });
        assert!(!view.is_connected());
        assert!(view
            .console()
            .entries()
            .iter()
            .any(|e| e.as_str() == "remote connect error no host channel after 3 attempts"));
    }

    #[test]
    fn test_second_connect_does_not_reannounce() {
        let (mut view, transport) = connected_view();
        view.connected(RecordingTransport::default());
        assert_eq!(transport.sent_types(), vec!["WEBVIEW_READY"]);
    }

    #[test]
    fn test_scenario_single_marker_click() {
        let (mut view, transport) = connected_view();
        view.handle_message(
            r#"{"type":"UPDATE_MARKERS","payload":{"markers":[{"id":1,"coords":[51.5,-0.09],"icon":"😴"}]}}"#,
        );
        let attached = view.map().widget().attached_markers();
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].coords, LatLng::new(51.5, -0.09));

        view.handle_ui(UiEvent::MarkerClick(attached[0].id.clone()));
        assert_eq!(
            transport.sent.borrow().last(),
            Some(&json!({"type": "MARKER_CLICKED", "payload": {"id": 1}}))
        );
    }

    #[test]
    fn test_marker_click_without_id_sends_null() {
        let (mut view, transport) = connected_view();
        view.handle_ui(UiEvent::MarkerClick(None));
        assert_eq!(
            transport.sent.borrow().last(),
            Some(&json!({"type": "MARKER_CLICKED", "payload": {"id": null}}))
        );
        assert_eq!(transport.sent_types(), vec!["WEBVIEW_READY", "MARKER_CLICKED"]);
    }

    #[test]
    fn test_map_click_emits_once_regardless_of_markers() {
        let (mut view, transport) = connected_view();
        view.handle_ui(UiEvent::MapClick(LatLng::new(1.0, 2.0)));
        view.handle_message(
            r#"{"type":"UPDATE_MARKERS","payload":{"markers":[{"coords":[1.0,2.0],"icon":"🚓"}]}}"#,
        );
        view.handle_ui(UiEvent::MapClick(LatLng::new(3.0, 4.0)));
        assert_eq!(
            transport.sent_types(),
            vec!["WEBVIEW_READY", "MAP_CLICKED", "MAP_CLICKED"]
        );
        assert_eq!(
            transport.sent.borrow()[2]["payload"],
            json!({"coords": {"lat": 3.0, "lng": 4.0}})
        );
    }

    #[test]
    fn test_malformed_marker_does_not_block_batch() {
        let (mut view, _) = connected_view();
        view.handle_message(
            r#"{"type":"UPDATE_MARKERS","payload":{"markers":[{"id":1,"icon":"😴"},{"id":2,"coords":[0,0],"icon":"😄"},{"id":3,"coords":[1,1],"icon":"😃"}]}}"#,
        );
        assert_eq!(view.state().markers.len(), 2);
        assert_eq!(view.map().widget().attached_markers().len(), 2);
        assert!(view
            .console()
            .entries()
            .iter()
            .any(|e| e.as_str().contains("missing coords")));
    }

    #[test]
    fn test_update_replaces_state_and_layer() {
        let (mut view, _) = connected_view();
        view.handle_message(
            r#"{"type":"UPDATE_MARKERS","payload":{"markers":[{"coords":[0,0]},{"coords":[1,1]}]}}"#,
        );
        view.handle_message(r#"{"type":"UPDATE_MARKERS","payload":{"markers":[]}}"#);
        assert!(view.state().markers.is_empty());
        let widget = view.map().widget();
        assert_eq!(widget.attached.len(), 1);
        assert!(widget.attached_markers().is_empty());
    }

    #[test]
    fn test_center_change_flies_and_records() {
        let (mut view, _) = connected_view();
        view.handle_message(
            r#"{"type":"MAP_CENTER_COORD_CHANGE","payload":{"mapCenterCoords":{"lat":40.7,"lng":-74.0}}}"#,
        );
        assert_eq!(view.state().map_center_coords, Some(LatLng::new(40.7, -74.0)));
        assert_eq!(view.map().widget().flown_to, vec![LatLng::new(40.7, -74.0)]);
        assert_eq!(view.map().phase(), MapPhase::Initialized);
    }

    #[test]
    fn test_emit_before_connect_is_logged_not_fatal() {
        let mut view = mounted_view();
        view.handle_ui(UiEvent::MapClick(LatLng::new(0.0, 0.0)));
        assert!(view
            .console()
            .entries()
            .iter()
            .any(|e| e.as_str() == "failed to emit MAP_CLICKED: bridge is not connected"));
    }

    #[test]
    fn test_set_debug_toggles_console_without_clearing() {
        let (mut view, _) = connected_view();
        let before = view.console().entries().len();
        assert!(before > 0);

        view.handle_message(r#"{"type":"SET_DEBUG","payload":{"showDebug":false}}"#);
        assert!(!view.state().show_debug);
        view.handle_ui(UiEvent::MapClick(LatLng::new(0.0, 0.0)));
        assert_eq!(view.console().entries().len(), before);

        view.handle_message(r#"{"type":"SET_DEBUG","payload":{"showDebug":true}}"#);
        view.handle_ui(UiEvent::MapClick(LatLng::new(0.0, 0.0)));
        assert_eq!(view.console().entries().len(), before + 1);
    }

    #[test]
    fn test_unknown_message_is_logged() {
        let (mut view, _) = connected_view();
        view.handle_message(r#"{"type":"NOPE","payload":{}}"#);
        assert!(view
            .console()
            .entries()
            .iter()
            .any(|e| e.as_str() == r#"dropping bridge message: unknown event type "NOPE""#));
    }

    #[test]
    fn test_update_before_mount_is_logged() {
        let mut view: TestView = MapView::new(MapConfig::default(), FakeWidget::default());
        view.handle_message(r#"{"type":"UPDATE_MARKERS","payload":{"markers":[]}}"#);
        assert!(view
            .console()
            .entries()
            .iter()
            .any(|e| e.as_str() == "error updating markers: map is not initialized"));
    }

    #[test]
    fn test_report_failures_match_rendered_count() {
        let mut view = mounted_view();
        let mut console = DebugConsole::new(false);
        let entries = vec![json!({"coords": [0.0, 0.0]}), json!("bad")];
        let (_, report) = view.map.update_markers(&entries, &mut console).unwrap();
        assert_eq!(report.rendered + report.failures.len(), entries.len());
        assert_eq!(
            report.failures,
            vec![BuildError::Invalid(MarkerError::NotAnObject { index: 1 })]
        );
    }

    #[test]
    fn test_unmount_releases_bridge_and_map() {
        let (mut view, _) = connected_view();
        view.unmount();
        assert!(!view.is_connected());
        assert!(view.map().widget().destroyed);
    }

    #[test]
    fn test_update_dumps_first_entry_when_debug_on() {
        let (mut view, _) = connected_view();
        view.handle_message(
            r#"{"type":"UPDATE_MARKERS","payload":{"markers":[{"id":1,"coords":[51.5,-0.09],"icon":"😴"},{"id":2,"coords":[0,0]}]}}"#,
        );
        let dumps: Vec<&LogEntry> = view
            .console()
            .entries()
            .iter()
            .filter(|e| matches!(e, LogEntry::Dump(_)))
            .collect();
        assert_eq!(dumps.len(), 1);
        assert!(dumps[0].as_str().contains("\"id\": 1"));
    }

    #[test]
    fn test_update_dumps_nothing_when_debug_off() {
        let config = MapConfig {
            show_debug: false,
            ..Default::default()
        };
        let mut view: TestView = MapView::new(config, FakeWidget::default());
        view.mount().unwrap();
        view.handle_message(
            r#"{"type":"UPDATE_MARKERS","payload":{"markers":[{"id":1,"coords":[0,0]}]}}"#,
        );
        assert!(view.console().entries().is_empty());
        assert_eq!(view.state().markers.len(), 1);
    }

    #[test]
    fn test_listener_failure_does_not_announce_ready() {
        let mut view = mounted_view();
        view.connection_failed(&BridgeError::Post("addEventListener threw".to_string()));
        assert!(!view.is_connected());
        assert!(view
            .console()
            .entries()
            .iter()
            .any(|e| e.as_str() == "remote connect error failed to post message: addEventListener threw"));
    }

    #[test]
    fn test_revision_advances_on_visible_changes() {
        let mut view = mounted_view();
        let start = view.revision();
        view.handle_message(r#"{"type":"UPDATE_MARKERS","payload":{"markers":[]}}"#);
        assert!(view.revision() > start);
    }
}
