//! Map controller: widget lifecycle and the replaceable marker layer.

use thiserror::Error;

use crate::config::TileSource;
use crate::console::DebugConsole;
use crate::geo::LatLng;
use crate::marker::{DivIcon, Marker, MarkerError, MarkerId};

/// Failure reported by the underlying map library.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct WidgetError(pub String);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("map is not initialized")]
    NotInitialized,
    #[error("map is already mounted")]
    AlreadyMounted,
    #[error("map init failed: {0}")]
    Init(WidgetError),
    #[error("map widget error: {0}")]
    Widget(WidgetError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Invalid(#[from] MarkerError),
    #[error("marker {index}: {source}")]
    Widget { index: usize, source: WidgetError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: f64,
    pub tile: TileSource,
}

/// Everything a widget needs to place one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub id: Option<MarkerId>,
    pub coords: LatLng,
    pub icon: DivIcon,
}

/// The mapping library, seen from the controller.
///
/// Implementations deliver map and marker clicks through their own callback
/// channel; the controller only drives construction and teardown.
pub trait MapWidget {
    type Marker;
    type Layer;

    /// Create the map, attach the base tiles and register the click listener.
    fn init(&mut self, options: &MapOptions) -> Result<(), WidgetError>;
    fn fly_to(&mut self, coords: LatLng) -> Result<(), WidgetError>;
    fn create_marker(&mut self, spec: &MarkerSpec) -> Result<Self::Marker, WidgetError>;
    /// Group markers into a layer and attach it to the map.
    fn add_layer(&mut self, markers: Vec<Self::Marker>) -> Result<Self::Layer, WidgetError>;
    fn remove_layer(&mut self, layer: &Self::Layer) -> Result<(), WidgetError>;
    /// Release the underlying map.
    fn destroy(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapPhase {
    Uninitialized,
    Initialized,
    Updated,
}

#[derive(Debug, Default, PartialEq)]
pub struct RebuildReport {
    /// Markers in the newly attached layer.
    pub rendered: usize,
    pub failures: Vec<BuildError>,
    pub layer_error: Option<WidgetError>,
}

pub struct MapController<W: MapWidget> {
    widget: W,
    phase: MapPhase,
    layer: Option<W::Layer>,
    /// Layers whose removal failed. They may still be on the map, so their
    /// click handlers must stay alive until unmount.
    stale_layers: Vec<W::Layer>,
    icon_font_px: u32,
}

impl<W: MapWidget> MapController<W> {
    pub fn new(widget: W, icon_font_px: u32) -> Self {
        Self {
            widget,
            phase: MapPhase::Uninitialized,
            layer: None,
            stale_layers: Vec::new(),
            icon_font_px,
        }
    }

    pub fn phase(&self) -> MapPhase {
        self.phase
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn has_layer(&self) -> bool {
        self.layer.is_some()
    }

    pub fn stale_layer_count(&self) -> usize {
        self.stale_layers.len()
    }

    pub fn mount(&mut self, options: &MapOptions) -> Result<(), MapError> {
        if self.phase != MapPhase::Uninitialized {
            return Err(MapError::AlreadyMounted);
        }
        self.widget.init(options).map_err(MapError::Init)?;
        self.phase = MapPhase::Initialized;
        Ok(())
    }

    pub fn fly_to(&mut self, coords: LatLng) -> Result<(), MapError> {
        if self.phase == MapPhase::Uninitialized {
            return Err(MapError::NotInitialized);
        }
        self.widget.fly_to(coords).map_err(MapError::Widget)
    }

    /// Rebuild the marker layer from raw payload entries.
    ///
    /// Returns the validated markers alongside the report. Failures are logged
    /// to `console` and skipped.
    pub fn update_markers(
        &mut self,
        entries: &[serde_json::Value],
        console: &mut DebugConsole,
    ) -> Result<(Vec<Marker>, RebuildReport), MapError> {
        if self.phase == MapPhase::Uninitialized {
            return Err(MapError::NotInitialized);
        }
        console.log_text("updating markers");
        if let Some(first) = entries.first() {
            console.log_value(first);
        }

        if let Some(old) = self.layer.take() {
            if let Err(e) = self.widget.remove_layer(&old) {
                tracing::warn!("error removing layer: {e}");
                console.log_text(format!("error removing layer: {e}"));
                self.stale_layers.push(old);
            }
        }

        let mut report = RebuildReport::default();
        let mut markers = Vec::with_capacity(entries.len());
        let mut widgets = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let built = Marker::from_value(index, entry)
                .map_err(BuildError::from)
                .and_then(|marker| {
                    let spec = MarkerSpec {
                        id: marker.id.clone(),
                        coords: marker.coords,
                        icon: marker.icon(self.icon_font_px),
                    };
                    self.widget
                        .create_marker(&spec)
                        .map(|w| (marker, w))
                        .map_err(|source| BuildError::Widget { index, source })
                });
            match built {
                Ok((marker, widget)) => {
                    markers.push(marker);
                    widgets.push(widget);
                }
                Err(e) => {
                    tracing::warn!("error adding marker: {e}");
                    console.log_text(format!("error adding marker: {e}"));
                    report.failures.push(e);
                }
            }
        }

        console.log_text("creating and adding layer");
        let count = widgets.len();
        match self.widget.add_layer(widgets) {
            Ok(layer) => {
                self.layer = Some(layer);
                report.rendered = count;
            }
            Err(e) => {
                tracing::error!("error adding layer: {e}");
                console.log_text(format!("error adding layer: {e}"));
                report.layer_error = Some(e);
            }
        }

        self.phase = MapPhase::Updated;
        Ok((markers, report))
    }

    /// Drop the marker layer and release the widget.
    pub fn unmount(&mut self) {
        if self.phase == MapPhase::Uninitialized {
            return;
        }
        if let Some(layer) = self.layer.take() {
            let _ = self.widget.remove_layer(&layer);
        }
        for layer in std::mem::take(&mut self.stale_layers) {
            let _ = self.widget.remove_layer(&layer);
        }
        self.widget.destroy();
        self.phase = MapPhase::Uninitialized;
    }
}
