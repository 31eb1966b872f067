//! Configuration for map view behavior
//!
//! Presets cover the two kinds of pages that embed a map (a city and a
//! country); anything else goes through a custom configuration, usually
//! parsed from JSON.

use crate::{
    constants::{
        CITY_DEFAULT_ZOOM, COUNTRY_DEFAULT_ZOOM, DEFAULT_ATTRIBUTION, DEFAULT_SCRIPT_SRC,
        DEFAULT_STYLESHEET_HREF, DEFAULT_TILE_URL, DEFAULT_ZOOM_STEP, FIT_PADDING_PX,
        MAX_INIT_ATTEMPTS, MAX_ZOOM, MIN_ZOOM,
    },
    core::model::CenterKind,
    MapError, Result,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum MapViewProfile {
    City,
    Country,
    Custom(MapViewConfig),
}

impl MapViewProfile {
    pub fn resolve(&self) -> MapViewConfig {
        match self {
            Self::City => MapViewConfig::default(),
            Self::Country => MapViewConfig {
                default_zoom: COUNTRY_DEFAULT_ZOOM,
                ..MapViewConfig::default()
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for MapViewProfile {
    fn default() -> Self {
        Self::City
    }
}

impl From<CenterKind> for MapViewProfile {
    fn from(kind: CenterKind) -> Self {
        match kind {
            CenterKind::City => Self::City,
            CenterKind::Country => Self::Country,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapViewConfig {
    /// Zoom used when there is nothing to fit and by the re-center control
    pub default_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Screen padding around fitted bounds
    pub fit_padding_px: f64,
    /// Increment of the overlay's zoom buttons
    pub zoom_step: i32,
    /// Engine creation attempts before giving up
    pub max_init_attempts: u32,
    pub tile_url_template: String,
    pub tile_subdomains: Vec<String>,
    pub attribution: String,
    pub stylesheet_href: String,
    pub script_src: String,
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self {
            default_zoom: CITY_DEFAULT_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            fit_padding_px: FIT_PADDING_PX,
            zoom_step: DEFAULT_ZOOM_STEP,
            max_init_attempts: MAX_INIT_ATTEMPTS,
            tile_url_template: DEFAULT_TILE_URL.to_string(),
            tile_subdomains: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            stylesheet_href: DEFAULT_STYLESHEET_HREF.to_string(),
            script_src: DEFAULT_SCRIPT_SRC.to_string(),
        }
    }
}

impl MapViewConfig {
    /// Parses a (possibly partial) JSON configuration and validates it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_zoom.is_finite() && self.max_zoom.is_finite()) {
            return Err(MapError::Config("zoom limits must be finite".into()));
        }
        if self.min_zoom > self.max_zoom {
            return Err(MapError::Config(format!(
                "min_zoom {} is above max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.min_zoom..=self.max_zoom).contains(&self.default_zoom) {
            return Err(MapError::Config(format!(
                "default_zoom {} outside {}..={}",
                self.default_zoom, self.min_zoom, self.max_zoom
            )));
        }
        if !self.fit_padding_px.is_finite() || self.fit_padding_px < 0.0 {
            return Err(MapError::Config(format!(
                "fit_padding_px must be a non-negative number, got {}",
                self.fit_padding_px
            )));
        }
        if self.max_init_attempts == 0 {
            return Err(MapError::Config("max_init_attempts must be at least 1".into()));
        }
        if self.zoom_step <= 0 {
            return Err(MapError::Config("zoom_step must be positive".into()));
        }
        Ok(())
    }

    /// Clamps a zoom level to the configured range
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}
