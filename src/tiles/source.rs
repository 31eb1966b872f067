use crate::core::{config::MapViewConfig, geo::TileCoord};
use crate::constants::{DEFAULT_ATTRIBUTION, DEFAULT_TILE_URL};

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;

    /// Licensing text the map must always show
    fn attribution(&self) -> &str;
}

/// Raster source driven by a `{s}/{z}/{x}/{y}` URL template
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateTileSource {
    template: String,
    subdomains: Vec<String>,
    attribution: String,
}

impl TemplateTileSource {
    pub fn new(template: impl Into<String>, subdomains: Vec<String>, attribution: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            subdomains,
            attribution: attribution.into(),
        }
    }

    /// The public OpenStreetMap tile servers
    pub fn openstreetmap() -> Self {
        Self::new(
            DEFAULT_TILE_URL,
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            DEFAULT_ATTRIBUTION,
        )
    }

    pub fn from_config(config: &MapViewConfig) -> Self {
        Self::new(
            config.tile_url_template.clone(),
            config.tile_subdomains.clone(),
            config.attribution.clone(),
        )
    }
}

impl Default for TemplateTileSource {
    fn default() -> Self {
        Self::openstreetmap()
    }
}

impl TileSource for TemplateTileSource {
    fn url(&self, coord: TileCoord) -> String {
        let url = self
            .template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());

        if self.subdomains.is_empty() {
            // No rotation configured; fall back to the bare host
            return url.replace("{s}.", "").replace("{s}", "");
        }

        let idx = ((coord.x + coord.y) % self.subdomains.len() as u32) as usize;
        url.replace("{s}", &self.subdomains[idx])
    }

    fn attribution(&self) -> &str {
        &self.attribution
    }
}
