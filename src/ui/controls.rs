//! Interaction overlay: re-center and zoom controls, the mappable count and
//! the tile attribution.

use crate::{
    core::{config::MapViewConfig, lifecycle::EngineLifecycle},
    layers::marker::MarkerSet,
    tiles::TileSource,
    ui::popup::business_count,
    Result,
};

/// Commands the overlay buttons issue against a lifecycle.
///
/// Every command is a no-op returning `Ok(false)` until the engine is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapControls {
    zoom_step: i32,
}

impl MapControls {
    pub fn new(zoom_step: i32) -> Self {
        Self {
            zoom_step: zoom_step.max(1),
        }
    }

    pub fn from_config(config: &MapViewConfig) -> Self {
        Self::new(config.zoom_step)
    }

    pub fn zoom_step(&self) -> i32 {
        self.zoom_step
    }

    /// Controls are shown only while the engine is ready
    pub fn enabled(&self, lifecycle: &EngineLifecycle) -> bool {
        lifecycle.phase().accepts_commands()
    }

    pub fn recenter(&self, lifecycle: &mut EngineLifecycle) -> Result<bool> {
        lifecycle.recenter()
    }

    pub fn zoom_in(&self, lifecycle: &mut EngineLifecycle) -> Result<bool> {
        lifecycle.zoom_by(self.zoom_step)
    }

    pub fn zoom_out(&self, lifecycle: &mut EngineLifecycle) -> Result<bool> {
        lifecycle.zoom_by(-self.zoom_step)
    }

    pub fn zoom_by(&self, lifecycle: &mut EngineLifecycle, delta: i32) -> Result<bool> {
        lifecycle.zoom_by(delta)
    }
}

impl Default for MapControls {
    fn default() -> Self {
        Self::from_config(&MapViewConfig::default())
    }
}

/// How many businesses made it onto the map, from the marker set rather
/// than the engine
pub fn marker_count_label(markers: &MarkerSet) -> String {
    let mappable = markers.mappable_count();
    if mappable == markers.total_entities {
        let noun = if mappable == 1 { "business" } else { "businesses" };
        format!("{} {} shown on map", mappable, noun)
    } else {
        format!(
            "{} of {} shown on map",
            mappable,
            business_count(markers.total_entities)
        )
    }
}

/// Tile provider credit; rendered whatever state the view is in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    html: String,
}

impl Attribution {
    /// `html` is trusted markup from configuration
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn from_config(config: &MapViewConfig) -> Self {
        Self::new(config.attribution.clone())
    }

    pub fn from_source(source: &dyn TileSource) -> Self {
        Self::new(source.attribution())
    }

    pub fn to_html(&self) -> String {
        format!("<div class=\"map-attribution\">{}</div>", self.html)
    }

    /// The credit without markup
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.html.len());
        let mut in_tag = false;
        for c in self.html.chars() {
            match c {
                '<' => in_tag = true,
                '>' => in_tag = false,
                _ if !in_tag => text.push(c),
                _ => {}
            }
        }
        text.replace("&copy;", "\u{a9}")
            .replace("&amp;", "&")
            .trim()
            .to_string()
    }
}

impl Default for Attribution {
    fn default() -> Self {
        Self::from_config(&MapViewConfig::default())
    }
}
