//! Headless engine: Web Mercator viewport math without any drawing.
//!
//! Used by the demo binary and the test suite. It keeps track of every
//! engine it creates and destroys so leaks show up as a non-zero
//! [`EngineStats::live`] count.

use crate::{
    constants::{MAX_ZOOM, MIN_ZOOM, TILE_SIZE},
    core::{
        geo::{LatLng, LatLngBounds, Point, TileCoord},
        model::MountNode,
    },
    layers::marker::Marker,
    prelude::HashMap,
    tiles::source::TileSource,
    traits::{EngineModule, MapEngine},
    MapError, Result,
};
use std::f64::consts::PI;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

/// Listeners a real engine registers on its container (resize, popup, zoom)
const ENGINE_LISTENERS: usize = 3;

/// Creation and disposal counters shared by a module and its engines
#[derive(Debug, Default)]
pub struct EngineStats {
    created: AtomicUsize,
    destroyed: AtomicUsize,
    failed_creates: AtomicUsize,
}

impl EngineStats {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn failed_creates(&self) -> usize {
        self.failed_creates.load(Ordering::SeqCst)
    }

    /// Engines created and not yet destroyed
    pub fn live(&self) -> usize {
        self.created().saturating_sub(self.destroyed())
    }
}

pub struct HeadlessModule {
    min_zoom: f64,
    max_zoom: f64,
    stats: Arc<EngineStats>,
    fail_next: AtomicU32,
    tile_source: Option<Arc<dyn TileSource>>,
}

impl HeadlessModule {
    pub fn new() -> Self {
        Self {
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            stats: Arc::new(EngineStats::default()),
            fail_next: AtomicU32::new(0),
            tile_source: None,
        }
    }

    pub fn with_zoom_range(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_tile_source(mut self, source: Arc<dyn TileSource>) -> Self {
        self.tile_source = Some(source);
        self
    }

    pub fn stats(&self) -> Arc<EngineStats> {
        self.stats.clone()
    }

    /// Makes the next `count` creations fail as if the container were unusable
    pub fn fail_next_creates(&self, count: u32) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    fn take_injected_failure(&self) -> bool {
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for HeadlessModule {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineModule for HeadlessModule {
    fn name(&self) -> &str {
        "headless"
    }

    fn create(&self, mount: &MountNode, center: LatLng, zoom: f64) -> Result<Box<dyn MapEngine>> {
        if !mount.attached {
            self.stats.failed_creates.fetch_add(1, Ordering::SeqCst);
            return Err(MapError::Engine(format!(
                "container '{}' is not attached to the document",
                mount.id
            )));
        }
        if self.take_injected_failure() {
            self.stats.failed_creates.fetch_add(1, Ordering::SeqCst);
            return Err(MapError::Engine(format!(
                "container '{}' rejected the engine",
                mount.id
            )));
        }

        self.stats.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(HeadlessEngine {
            container_id: mount.id.clone(),
            size: mount.size,
            center,
            zoom: zoom.clamp(self.min_zoom, self.max_zoom),
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            markers: HashMap::default(),
            marker_order: Vec::new(),
            listeners: ENGINE_LISTENERS,
            destroyed: false,
            stats: self.stats.clone(),
            tile_source: self.tile_source.clone(),
        }))
    }
}

pub struct HeadlessEngine {
    container_id: String,
    size: Point,
    center: LatLng,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    markers: HashMap<String, Marker>,
    marker_order: Vec<String>,
    listeners: usize,
    destroyed: bool,
    stats: Arc<EngineStats>,
    tile_source: Option<Arc<dyn TileSource>>,
}

impl HeadlessEngine {
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn size(&self) -> Point {
        self.size
    }

    /// Markers in the order they were added
    pub fn markers(&self) -> Vec<&Marker> {
        self.marker_order
            .iter()
            .filter_map(|id| self.markers.get(id))
            .collect()
    }

    pub fn popup_html(&self, marker_id: &str) -> Option<String> {
        self.markers.get(marker_id).map(|m| m.popup.to_html())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Projects to world pixel coordinates at `zoom` (EPSG:3857)
    pub fn project(lat_lng: &LatLng, zoom: f64) -> Point {
        let scale = TILE_SIZE as f64 * 2_f64.powf(zoom);
        let lat_rad = LatLng::clamp_lat(lat_lng.lat).to_radians();
        let x = (lat_lng.lng + 180.0) / 360.0 * scale;
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * scale;
        Point::new(x, y)
    }

    /// Tiles covering the current view at the nearest integer zoom
    pub fn visible_tiles(&self) -> Vec<TileCoord> {
        let z = self.zoom.round().clamp(0.0, 30.0) as u8;
        let center = Self::project(&self.center, z as f64);
        let tile = TILE_SIZE as f64;
        let max = 2_f64.powi(z as i32) - 1.0;

        let min_x = ((center.x - self.size.x / 2.0) / tile).floor().clamp(0.0, max) as u32;
        let max_x = ((center.x + self.size.x / 2.0) / tile).floor().clamp(0.0, max) as u32;
        let min_y = ((center.y - self.size.y / 2.0) / tile).floor().clamp(0.0, max) as u32;
        let max_y = ((center.y + self.size.y / 2.0) / tile).floor().clamp(0.0, max) as u32;

        let mut tiles = Vec::new();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                tiles.push(TileCoord::new(x, y, z));
            }
        }
        tiles
    }

    /// URLs the view needs, when a tile source is configured
    pub fn tile_urls(&self) -> Vec<String> {
        match &self.tile_source {
            Some(source) => self
                .visible_tiles()
                .into_iter()
                .map(|coord| source.url(coord))
                .collect(),
            None => Vec::new(),
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            Err(MapError::Engine(format!(
                "engine for '{}' used after destroy",
                self.container_id
            )))
        } else {
            Ok(())
        }
    }
}

impl MapEngine for HeadlessEngine {
    fn set_view(&mut self, center: LatLng, zoom: f64) -> Result<()> {
        self.ensure_alive()?;
        self.center = center;
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        Ok(())
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds, padding_px: f64) -> Result<()> {
        self.ensure_alive()?;
        self.center = bounds.center();

        let available = Point::new(
            self.size.x - 2.0 * padding_px,
            self.size.y - 2.0 * padding_px,
        );

        // Largest integer zoom at which the projected box still fits
        let mut best_zoom = self.min_zoom;
        for test_zoom in (self.min_zoom.ceil() as i32)..=(self.max_zoom.floor() as i32) {
            let zoom = test_zoom as f64;
            let nw = Self::project(
                &LatLng::new(bounds.north_east.lat, bounds.south_west.lng),
                zoom,
            );
            let se = Self::project(
                &LatLng::new(bounds.south_west.lat, bounds.north_east.lng),
                zoom,
            );

            if (se.x - nw.x).abs() <= available.x && (se.y - nw.y).abs() <= available.y {
                best_zoom = zoom;
            } else {
                break;
            }
        }

        self.zoom = best_zoom;
        Ok(())
    }

    fn add_marker(&mut self, marker: &Marker) -> Result<()> {
        self.ensure_alive()?;
        if self.markers.insert(marker.id.clone(), marker.clone()).is_none() {
            self.marker_order.push(marker.id.clone());
        }
        Ok(())
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
        self.marker_order.clear();
    }

    fn center(&self) -> LatLng {
        self.center
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn zoom_range(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    fn invalidate_size(&mut self, size: Point) {
        if !self.destroyed {
            self.size = size;
        }
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.clear_markers();
        self.listeners = 0;
        self.destroyed = true;
        self.stats.destroyed.fetch_add(1, Ordering::SeqCst);
        log::debug!("headless engine for '{}' destroyed", self.container_id);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
