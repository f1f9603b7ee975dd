use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use std::sync::mpsc::{Receiver, channel};
use tracing::{debug, info};

use crate::{
    chart::VisualizationPanel,
    config::{AtlasConfig, Basemap},
    data::{DataCache, ForestCover, RegionFeature},
    error::AtlasError,
    map_draw::{Cursor, MapSurface, PAN_FRACTION, SurfaceEvent, Viewport, ZOOM_STEP},
};

pub struct AppState {
    pub surface: MapSurface,
    pub panel: VisualizationPanel,
    dataset: ForestCover,
    /// Region chosen by the last feature click. Closing the popup keeps it.
    selection: Option<String>,
    events: Option<Receiver<SurfaceEvent>>,
    pub status: String,
}

impl AppState {
    pub const HELP_TEXT: &'static str = "click: chart · Esc: close · drag/arrows: pan · wheel/+/-: zoom · q: quit";

    pub fn new(config: &AtlasConfig) -> Result<Self, AtlasError> {
        let cache = DataCache::new(&config.data_dir);
        let features = cache.load_features(&config.features_file)?;
        let dataset = cache.load_dataset(&config.dataset_file)?;
        dataset.verify_joins(&features, config.strict)?;
        info!(
            features = features.len(),
            records = dataset.len(),
            dir = %cache.base().display(),
            "data loaded"
        );

        let viewport = Viewport { center: config.center, zoom: config.zoom };
        Ok(Self::from_parts(features, dataset, viewport, config.basemap))
    }

    pub fn from_parts(
        features: Vec<RegionFeature>,
        dataset: ForestCover,
        viewport: Viewport,
        basemap: Basemap,
    ) -> Self {
        Self {
            surface: MapSurface::new(features, viewport, basemap),
            panel: VisualizationPanel::new(),
            dataset,
            selection: None,
            events: None,
            status: Self::HELP_TEXT.to_string(),
        }
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Attaches the map with a fresh event channel; the old one is dropped.
    pub fn mount(&mut self, container: Rect) {
        let (tx, rx) = channel();
        self.surface.initialize(container, Box::new(tx));
        self.events = Some(rx);
    }

    pub fn unmount(&mut self) {
        self.surface.teardown();
        self.events = None;
    }

    /// Called on every frame with the current map area.
    pub fn attach_map(&mut self, container: Rect) {
        match self.surface.container() {
            None => self.mount(container),
            Some(current) if current != container => self.surface.resize(container),
            Some(_) => {}
        }
    }

    /// Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        use KeyCode::*;
        match key {
            Char('q') => return true,
            Esc => self.surface.close_popup(),
            Left => self.surface.pan(-PAN_FRACTION, 0.0),
            Right => self.surface.pan(PAN_FRACTION, 0.0),
            Up => self.surface.pan(0.0, PAN_FRACTION),
            Down => self.surface.pan(0.0, -PAN_FRACTION),
            Char('+') | Char('=') => self.surface.zoom_by(ZOOM_STEP),
            Char('-') => self.surface.zoom_by(-ZOOM_STEP),
            _ => {}
        }
        self.drain_events();
        false
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let cell = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved => self.surface.on_pointer_move(cell),
            MouseEventKind::Down(MouseButton::Left) => self.surface.on_press(cell),
            MouseEventKind::Drag(MouseButton::Left) => self.surface.on_drag(cell),
            MouseEventKind::Up(MouseButton::Left) => self.surface.on_release(cell),
            MouseEventKind::ScrollUp => self.surface.zoom_by(ZOOM_STEP),
            MouseEventKind::ScrollDown => self.surface.zoom_by(-ZOOM_STEP),
            _ => {}
        }
        self.drain_events();
    }

    /// Applies everything the surface emitted, in order.
    pub fn drain_events(&mut self) {
        let Some(rx) = &self.events else { return };
        let pending: Vec<SurfaceEvent> = rx.try_iter().collect();
        for event in pending {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Select { location, .. } => {
                info!(%location, "region selected");
                self.selection = Some(location);
                // Re-derived even for the same region: the chart is a pure function of it.
                match self.panel.update(self.selection.as_deref(), &self.dataset) {
                    Ok(()) => self.status = Self::HELP_TEXT.to_string(),
                    Err(err) => self.status = err.to_string(),
                }
            }
            SurfaceEvent::Hover { cursor, location } => {
                self.status = match (cursor, location) {
                    (Cursor::Pointer, Some(location)) => location,
                    _ => Self::HELP_TEXT.to_string(),
                };
            }
            SurfaceEvent::PopupClose => {
                debug!(selection = ?self.selection, "popup closed");
            }
        }
    }

    /// True only while the popup is on screen. A popup whose anchor was
    /// panned out of view stays open and shows up again when panned back.
    pub fn panel_visible(&self) -> bool {
        self.surface.popup_rect().is_some()
    }
}
