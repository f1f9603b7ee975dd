use geo::Coord;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    widgets::{
        Block, Borders, Clear,
        canvas::{Canvas, Map, MapResolution},
    },
};
use std::{collections::HashMap, sync::mpsc::Sender};
use tracing::{debug, trace, warn};

use crate::{
    config::{Basemap, MAX_ZOOM, MIN_ZOOM},
    data::RegionFeature,
};

/// Longitude span shown at zoom 0; every zoom level halves it.
const DEGREES_AT_ZOOM_ZERO: f64 = 1024.0;
/// Terminal cells are about twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;
pub const PAN_FRACTION: f64 = 0.25;
pub const ZOOM_STEP: f64 = 0.5;

const POPUP_SIZE: (u16, u16) = (48, 16);
const CLOSER: &str = "[x]";
const MARKER: &str = "●";
const MARKER_COLOR: Color = Color::Rgb(255, 165, 0);

/// Terminal cell, absolute (column, row).
pub type Cell = (u16, u16);

/// Hover affordance over the map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

/// Callbacks the surface invokes; the only way selection leaves the map.
pub trait SurfaceListener {
    fn on_select(&mut self, location: &str, coordinate: Coord<f64>);
    fn on_hover(&mut self, cursor: Cursor, location: Option<&str>);
    fn on_popup_close(&mut self);
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceEvent {
    Select { location: String, coordinate: Coord<f64> },
    Hover { cursor: Cursor, location: Option<String> },
    PopupClose,
}

impl SurfaceListener for Sender<SurfaceEvent> {
    fn on_select(&mut self, location: &str, coordinate: Coord<f64>) {
        let event = SurfaceEvent::Select { location: location.to_string(), coordinate };
        if self.send(event).is_err() {
            trace!("select dropped, no receiver");
        }
    }

    fn on_hover(&mut self, cursor: Cursor, location: Option<&str>) {
        let event = SurfaceEvent::Hover { cursor, location: location.map(str::to_string) };
        if self.send(event).is_err() {
            trace!("hover dropped, no receiver");
        }
    }

    fn on_popup_close(&mut self) {
        if self.send(SurfaceEvent::PopupClose).is_err() {
            trace!("popup close dropped, no receiver");
        }
    }
}

/// Visible lon/lat window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Extent {
    fn contains(&self, c: Coord<f64>) -> bool {
        c.x >= self.west && c.x <= self.east && c.y >= self.south && c.y <= self.north
    }
}

/// View center and zoom, EPSG:4326.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub center: Coord<f64>,
    pub zoom: f64,
}

impl Viewport {
    pub fn extent(&self, container: Rect) -> Extent {
        let w = f64::from(container.width.max(1));
        let h = f64::from(container.height.max(1));
        let lon_span = DEGREES_AT_ZOOM_ZERO / 2f64.powf(self.zoom);
        let lat_span = lon_span * h * CELL_ASPECT / w;
        Extent {
            west: self.center.x - lon_span / 2.0,
            east: self.center.x + lon_span / 2.0,
            south: self.center.y - lat_span / 2.0,
            north: self.center.y + lat_span / 2.0,
        }
    }

    /// Map coordinate → cell inside `container`, or `None` when not visible.
    pub fn project(&self, container: Rect, coord: Coord<f64>) -> Option<Cell> {
        if container.width == 0 || container.height == 0 {
            return None;
        }
        let ext = self.extent(container);
        if !ext.contains(coord) {
            return None;
        }
        let w = f64::from(container.width);
        let h = f64::from(container.height);
        let col = ((coord.x - ext.west) / (ext.east - ext.west) * w).floor() as u16;
        let row = ((ext.north - coord.y) / (ext.north - ext.south) * h).floor() as u16;
        Some((
            container.x + col.min(container.width - 1),
            container.y + row.min(container.height - 1),
        ))
    }

    /// Cell → map coordinate of the cell center.
    pub fn unproject(&self, container: Rect, cell: Cell) -> Coord<f64> {
        let ext = self.extent(container);
        let w = f64::from(container.width.max(1));
        let h = f64::from(container.height.max(1));
        let col = f64::from(cell.0.saturating_sub(container.x)) + 0.5;
        let row = f64::from(cell.1.saturating_sub(container.y)) + 0.5;
        Coord {
            x: ext.west + col / w * (ext.east - ext.west),
            y: ext.north - row / h * (ext.north - ext.south),
        }
    }
}

fn contains(rect: Rect, cell: Cell) -> bool {
    cell.0 >= rect.x && cell.0 < rect.x + rect.width && cell.1 >= rect.y && cell.1 < rect.y + rect.height
}

/// Resources that exist only while the surface is attached to a container.
struct Attachment {
    container: Rect,
    listener: Box<dyn SurfaceListener>,
    /// Features per visible cell, in feature order.
    index: HashMap<Cell, Vec<usize>>,
}

/// Left button held down on the map.
#[derive(Clone, Copy, Debug)]
struct Press {
    origin: Cell,
    last: Cell,
    dragged: bool,
    on_popup: bool,
}

/// Basemap, point layer and the chart popup.
pub struct MapSurface {
    features: Vec<RegionFeature>,
    viewport: Viewport,
    basemap: Basemap,
    attachment: Option<Attachment>,
    popup: Option<Coord<f64>>,
    cursor: Cursor,
    hovered: Option<usize>,
    /// Last cell the pointer was seen at; hover is recomputed from it when the view moves.
    pointer: Option<Cell>,
    press: Option<Press>,
}

impl MapSurface {
    pub fn new(features: Vec<RegionFeature>, viewport: Viewport, basemap: Basemap) -> Self {
        Self {
            features,
            viewport,
            basemap,
            attachment: None,
            popup: None,
            cursor: Cursor::Default,
            hovered: None,
            pointer: None,
            press: None,
        }
    }

    /// Attaches to `container` and registers `listener` as the only handler.
    ///
    /// An existing attachment is torn down first, so handlers never stack up.
    pub fn initialize(&mut self, container: Rect, listener: Box<dyn SurfaceListener>) {
        if self.attachment.is_some() {
            warn!("map surface initialized twice; tearing down the previous attachment");
            self.teardown();
        }
        let index = self.build_index(container);
        debug!(?container, visible = index.values().map(Vec::len).sum::<usize>(), "map surface attached");
        self.attachment = Some(Attachment { container, listener, index });
    }

    /// Detaches and drops the listener and the cell index. No-op when detached.
    pub fn teardown(&mut self) {
        if self.attachment.take().is_none() {
            return;
        }
        self.popup = None;
        self.cursor = Cursor::Default;
        self.hovered = None;
        self.pointer = None;
        self.press = None;
        debug!("map surface detached");
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn container(&self) -> Option<Rect> {
        self.attachment.as_ref().map(|a| a.container)
    }

    /// Keeps the listener and popup, re-indexes for the new container.
    ///
    /// Markers move under a still pointer, so hover is hit-tested again.
    pub fn resize(&mut self, container: Rect) {
        let index = self.build_index(container);
        let Some(att) = self.attachment.as_mut() else { return };
        att.container = container;
        att.index = index;
        trace!(?container, "map surface resized");
        self.refresh_hover();
    }

    /// Moves the center by a fraction of the visible span.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let Some(container) = self.container() else { return };
        let ext = self.viewport.extent(container);
        self.viewport.center.x = (self.viewport.center.x + dx * (ext.east - ext.west)).clamp(-180.0, 180.0);
        self.viewport.center.y = (self.viewport.center.y + dy * (ext.north - ext.south)).clamp(-90.0, 90.0);
        self.resize(container);
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.viewport.zoom = (self.viewport.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        if let Some(container) = self.container() {
            self.resize(container);
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn features(&self) -> &[RegionFeature] {
        &self.features
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn hovered(&self) -> Option<&RegionFeature> {
        self.hovered.and_then(|i| self.features.get(i))
    }

    pub fn popup_position(&self) -> Option<Coord<f64>> {
        self.popup
    }

    /// Features drawn at `cell`, first one on top.
    pub fn hit_test(&self, cell: Cell) -> &[usize] {
        self.attachment
            .as_ref()
            .and_then(|a| a.index.get(&cell))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Cell where a feature's marker is drawn, if visible.
    pub fn feature_cell(&self, location: &str) -> Option<Cell> {
        let container = self.container()?;
        let feature = self.features.iter().find(|f| f.location == location)?;
        self.viewport.project(container, feature.point.0)
    }

    pub fn on_pointer_move(&mut self, cell: Cell) {
        if self.attachment.is_none() {
            return;
        }
        self.pointer = Some(cell);
        self.refresh_hover();
    }

    /// Left button down. The click itself fires on release, unless the map was dragged.
    pub fn on_press(&mut self, cell: Cell) {
        if self.attachment.is_none() {
            return;
        }
        let on_popup = self.popup_rect().is_some_and(|r| contains(r, cell));
        self.press = Some(Press { origin: cell, last: cell, dragged: false, on_popup });
    }

    /// Pans so the map follows the pointer.
    pub fn on_drag(&mut self, cell: Cell) {
        let Some(container) = self.container() else { return };
        let Some(press) = self.press.as_mut() else { return };
        self.pointer = Some(cell);
        if press.on_popup || cell == press.last {
            return;
        }
        let dcol = f64::from(cell.0) - f64::from(press.last.0);
        let drow = f64::from(cell.1) - f64::from(press.last.1);
        press.last = cell;
        press.dragged = true;
        self.pan(-dcol / f64::from(container.width.max(1)), drow / f64::from(container.height.max(1)));
    }

    pub fn on_release(&mut self, _cell: Cell) {
        let Some(press) = self.press.take() else { return };
        if !press.dragged {
            self.on_click(press.origin);
        }
    }

    fn refresh_hover(&mut self) {
        let Some(att) = self.attachment.as_mut() else { return };
        let hit = self.pointer.and_then(|cell| {
            let over_popup =
                popup_rect_in(&self.viewport, att.container, self.popup).is_some_and(|r| contains(r, cell));
            if over_popup {
                None
            } else {
                att.index.get(&cell).and_then(|hits| hits.first().copied())
            }
        });
        let cursor = if hit.is_some() { Cursor::Pointer } else { Cursor::Default };

        if cursor == self.cursor && hit == self.hovered {
            return;
        }
        self.cursor = cursor;
        self.hovered = hit;
        let location = hit.map(|i| self.features[i].location.as_str());
        att.listener.on_hover(cursor, location);
    }

    pub fn on_click(&mut self, cell: Cell) {
        let Some(container) = self.container() else { return };

        if let Some(rect) = self.popup_rect() {
            if contains(rect, cell) {
                if contains(closer_rect(rect), cell) {
                    self.close_popup();
                }
                return;
            }
        }

        let Some(&first) = self.hit_test(cell).first() else {
            trace!(?cell, "click on empty map");
            return;
        };
        let coordinate = self.viewport.unproject(container, cell);
        self.popup = Some(coordinate);

        let location = self.features[first].location.as_str();
        debug!(%location, lon = coordinate.x, lat = coordinate.y, "feature selected");
        if let Some(att) = self.attachment.as_mut() {
            att.listener.on_select(location, coordinate);
        }
    }

    /// Hides the popup. Selection lives elsewhere and is left alone.
    pub fn close_popup(&mut self) {
        if self.popup.take().is_none() {
            return;
        }
        if let Some(att) = self.attachment.as_mut() {
            att.listener.on_popup_close();
        }
    }

    /// Popup box, shifted to stay inside the map; `None` when hidden or when
    /// its anchor is scrolled out of view.
    pub fn popup_rect(&self) -> Option<Rect> {
        popup_rect_in(&self.viewport, self.container()?, self.popup)
    }

    pub fn closer_rect(&self) -> Option<Rect> {
        self.popup_rect().map(closer_rect)
    }

    /// Draws the basemap and markers; the selected region in red.
    pub fn render(&self, f: &mut Frame, highlight: Option<&str>) {
        let Some(container) = self.container() else { return };
        let ext = self.viewport.extent(container);

        let resolution = match self.basemap {
            Basemap::Low => Some(MapResolution::Low),
            Basemap::High => Some(MapResolution::High),
            Basemap::None => None,
        };
        if let Some(resolution) = resolution {
            let canvas = Canvas::default()
                .marker(Marker::Braille)
                .x_bounds([ext.west, ext.east])
                .y_bounds([ext.south, ext.north])
                .paint(|ctx| {
                    ctx.draw(&Map { resolution, color: Color::DarkGray });
                });
            f.render_widget(canvas, container);
        }

        let buf = f.buffer_mut();
        for (i, feature) in self.features.iter().enumerate() {
            let Some((x, y)) = self.viewport.project(container, feature.point.0) else { continue };
            let style = if highlight == Some(feature.location.as_str()) {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else if self.hovered == Some(i) {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(MARKER_COLOR)
            };
            buf.set_string(x, y, MARKER, style);
        }
    }

    /// Draws the popup frame with its close control; `content` fills the inside.
    pub fn render_popup<F>(&self, f: &mut Frame, content: F)
    where
        F: FnOnce(&mut Frame, Rect),
    {
        let Some(rect) = self.popup_rect() else { return };
        let block = Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Gray));
        let inner = block.inner(rect);
        f.render_widget(Clear, rect);
        f.render_widget(block, rect);

        let closer = closer_rect(rect);
        f.buffer_mut().set_string(closer.x, closer.y, CLOSER, Style::default().fg(Color::White));
        content(f, inner);
    }

    fn build_index(&self, container: Rect) -> HashMap<Cell, Vec<usize>> {
        let mut index: HashMap<Cell, Vec<usize>> = HashMap::new();
        for (i, feature) in self.features.iter().enumerate() {
            if let Some(cell) = self.viewport.project(container, feature.point.0) {
                index.entry(cell).or_default().push(i);
            }
        }
        index
    }
}

fn popup_rect_in(viewport: &Viewport, container: Rect, anchor: Option<Coord<f64>>) -> Option<Rect> {
    let (ax, ay) = viewport.project(container, anchor?)?;
    let width = POPUP_SIZE.0.min(container.width);
    let height = POPUP_SIZE.1.min(container.height);

    // above the anchor, below it when there is no room
    let (ax, ay) = (i32::from(ax), i32::from(ay));
    let (cx, cy) = (i32::from(container.x), i32::from(container.y));
    let mut y = ay - i32::from(height);
    if y < cy {
        y = ay + 1;
    }
    let max_x = cx + i32::from(container.width - width);
    let max_y = cy + i32::from(container.height - height);
    let x = (ax - 4).clamp(cx, max_x);
    let y = y.clamp(cy, max_y);

    Some(Rect::new(x as u16, y as u16, width, height))
}

fn closer_rect(popup: Rect) -> Rect {
    let width = popup.width.min(3);
    Rect::new(popup.x + popup.width.saturating_sub(width + 1), popup.y, width, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use std::sync::mpsc::{Receiver, channel};

    const CONTAINER: Rect = Rect { x: 1, y: 1, width: 100, height: 40 };

    fn feature(location: &str, x: f64, y: f64) -> RegionFeature {
        RegionFeature { location: location.into(), point: Point::new(x, y), pointer: true }
    }

    fn surface() -> MapSurface {
        let features = vec![
            feature("Kerala", 76.27, 10.85),
            feature("Assam", 92.94, 26.2),
            feature("Delhi", 77.1, 28.7),
        ];
        MapSurface::new(features, Viewport { center: Coord { x: 79.0, y: 22.0 }, zoom: 4.8 }, Basemap::None)
    }

    fn attached() -> (MapSurface, Receiver<SurfaceEvent>) {
        let mut s = surface();
        let (tx, rx) = channel();
        s.initialize(CONTAINER, Box::new(tx));
        (s, rx)
    }

    fn cell_of(s: &MapSurface, location: &str) -> Cell {
        s.feature_cell(location).expect("feature visible")
    }

    /// A cell inside the map with nothing on it.
    fn empty_cell(s: &MapSurface) -> Cell {
        let c = (CONTAINER.x + 2, CONTAINER.y + CONTAINER.height - 2);
        assert!(s.hit_test(c).is_empty());
        c
    }

    #[test]
    fn project_and_unproject_agree_on_cells() {
        let vp = Viewport { center: Coord { x: 79.0, y: 22.0 }, zoom: 4.8 };
        for cell in [(1, 1), (50, 20), (100, 40), (37, 3)] {
            let coord = vp.unproject(CONTAINER, cell);
            assert_eq!(vp.project(CONTAINER, coord), Some(cell));
        }
        assert_eq!(vp.project(CONTAINER, Coord { x: -10.0, y: 0.0 }), None);
    }

    #[test]
    fn hover_sets_pointer_only_over_features() {
        let (mut s, rx) = attached();
        let kerala = cell_of(&s, "Kerala");

        s.on_pointer_move(kerala);
        assert_eq!(s.cursor(), Cursor::Pointer);
        assert_eq!(s.hovered().unwrap().location, "Kerala");

        // same cell again: no new event
        s.on_pointer_move(kerala);
        s.on_pointer_move(empty_cell(&s));
        assert_eq!(s.cursor(), Cursor::Default);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            [
                SurfaceEvent::Hover { cursor: Cursor::Pointer, location: Some("Kerala".into()) },
                SurfaceEvent::Hover { cursor: Cursor::Default, location: None },
            ]
        );
    }

    #[test]
    fn click_on_empty_map_changes_nothing() {
        let (mut s, rx) = attached();
        s.on_click(empty_cell(&s));
        assert!(s.popup_position().is_none());
        assert!(rx.try_recv().is_err());

        // an open popup stays open
        s.on_click(cell_of(&s, "Delhi"));
        let before = s.popup_position();
        rx.try_iter().count();
        s.on_click(empty_cell(&s));
        assert_eq!(s.popup_position(), before);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn click_on_feature_selects_and_opens_popup_there() {
        let (mut s, rx) = attached();
        let cell = cell_of(&s, "Assam");
        s.on_click(cell);

        let Ok(SurfaceEvent::Select { location, coordinate }) = rx.try_recv() else {
            panic!("expected select");
        };
        assert_eq!(location, "Assam");
        assert_eq!(s.popup_position(), Some(coordinate));
        assert_eq!(s.viewport().project(CONTAINER, coordinate), Some(cell));

        let rect = s.popup_rect().unwrap();
        assert!(rect.x >= CONTAINER.x && rect.right() <= CONTAINER.right());
        assert!(rect.y >= CONTAINER.y && rect.bottom() <= CONTAINER.bottom());
    }

    #[test]
    fn first_hit_wins_when_features_share_a_cell() {
        let features = vec![feature("Goa", 74.0, 15.3), feature("Goa twin", 74.0, 15.3)];
        let mut s = MapSurface::new(features, Viewport { center: Coord { x: 79.0, y: 22.0 }, zoom: 4.8 }, Basemap::None);
        let (tx, rx) = channel();
        s.initialize(CONTAINER, Box::new(tx));

        let cell = cell_of(&s, "Goa");
        assert_eq!(s.hit_test(cell), [0, 1]);
        s.on_click(cell);
        assert!(matches!(rx.try_recv(), Ok(SurfaceEvent::Select { location, .. }) if location == "Goa"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closer_hides_popup_and_emits_close() {
        let (mut s, rx) = attached();
        s.on_click(cell_of(&s, "Kerala"));
        rx.try_iter().count();

        let closer = s.closer_rect().unwrap();
        s.on_click((closer.x + 1, closer.y));
        assert!(s.popup_position().is_none());
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), [SurfaceEvent::PopupClose]);

        // closing again is silent
        s.close_popup();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn click_inside_popup_body_is_swallowed() {
        let (mut s, rx) = attached();
        s.on_click(cell_of(&s, "Kerala"));
        rx.try_iter().count();
        let rect = s.popup_rect().unwrap();
        s.on_click((rect.x + 2, rect.y + rect.height / 2));
        assert!(s.popup_position().is_some());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn teardown_is_idempotent_and_remount_has_single_handler() {
        let (mut s, old_rx) = attached();
        s.teardown();
        s.teardown();
        assert!(!s.is_attached());

        // detached surface ignores input
        s.on_click((50, 20));
        assert!(old_rx.try_recv().is_err());

        let (tx, rx) = channel();
        s.initialize(CONTAINER, Box::new(tx));
        s.on_click(cell_of(&s, "Delhi"));

        assert_eq!(rx.try_iter().count(), 1);
        assert!(old_rx.try_recv().is_err());
    }

    #[test]
    fn double_initialize_replaces_handler() {
        let (mut s, first_rx) = attached();
        let (tx, second_rx) = channel();
        s.initialize(CONTAINER, Box::new(tx));
        s.on_click(cell_of(&s, "Delhi"));

        assert_eq!(first_rx.try_iter().count(), 0);
        assert_eq!(second_rx.try_iter().count(), 1);
    }

    #[test]
    fn zoom_and_pan_rebuild_the_index() {
        let (mut s, _rx) = attached();
        let before = cell_of(&s, "Delhi");
        s.zoom_by(ZOOM_STEP);
        let after = cell_of(&s, "Delhi");
        assert_ne!(before, after);
        assert!(!s.hit_test(after).is_empty());

        s.zoom_by(100.0);
        assert_eq!(s.viewport().zoom, MAX_ZOOM);

        s.pan(PAN_FRACTION, 0.0);
        assert!(s.viewport().center.x > 79.0);
    }

    #[test]
    fn hover_is_recomputed_when_the_view_moves() {
        let (mut s, rx) = attached();
        let delhi = cell_of(&s, "Delhi");
        s.on_pointer_move(delhi);
        assert_eq!(s.cursor(), Cursor::Pointer);
        rx.try_iter().count();

        // the pointer stays put while the marker moves away from it
        s.zoom_by(ZOOM_STEP);
        assert!(s.hit_test(delhi).is_empty());
        assert_eq!(s.cursor(), Cursor::Default);
        assert!(s.hovered().is_none());
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            [SurfaceEvent::Hover { cursor: Cursor::Default, location: None }]
        );

        // and a view change that keeps it under the pointer sends nothing
        let moved = cell_of(&s, "Delhi");
        s.on_pointer_move(moved);
        rx.try_iter().count();
        s.resize(CONTAINER);
        assert_eq!(s.hovered().unwrap().location, "Delhi");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn press_and_release_in_place_is_a_click() {
        let (mut s, rx) = attached();
        let delhi = cell_of(&s, "Delhi");
        s.on_press(delhi);
        assert!(rx.try_recv().is_err());
        s.on_release(delhi);
        assert!(matches!(rx.try_recv(), Ok(SurfaceEvent::Select { location, .. }) if location == "Delhi"));
        assert!(s.popup_position().is_some());
    }

    #[test]
    fn drag_pans_the_map_and_does_not_select() {
        let (mut s, rx) = attached();
        let delhi = cell_of(&s, "Delhi");
        let center = s.viewport().center;

        s.on_press(delhi);
        s.on_drag((delhi.0 + 10, delhi.1 + 4));
        s.on_release((delhi.0 + 10, delhi.1 + 4));

        let moved = s.viewport().center;
        assert!(moved.x < center.x, "dragging right shows what lies west");
        assert!(moved.y > center.y, "dragging down shows what lies north");
        assert_eq!(cell_of(&s, "Delhi"), (delhi.0 + 10, delhi.1 + 4));
        assert!(s.popup_position().is_none());
        assert!(!rx.try_iter().any(|e| matches!(e, SurfaceEvent::Select { .. })));
    }

    #[test]
    fn drag_started_on_popup_does_not_pan() {
        let (mut s, _rx) = attached();
        s.on_click(cell_of(&s, "Kerala"));
        let rect = s.popup_rect().unwrap();
        let center = s.viewport().center;

        s.on_press((rect.x + 2, rect.y + 2));
        s.on_drag((rect.x + 6, rect.y + 3));
        s.on_release((rect.x + 6, rect.y + 3));
        assert_eq!(s.viewport().center, center);
        assert!(s.popup_position().is_some());
    }
}
