//! Core constants derived from Leaflet defaults and common web-map conventions.
//! Keeping them in a single place makes it easier to tweak view-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Zoom used when a city is centered without anything to fit.
pub const CITY_DEFAULT_ZOOM: f64 = 13.0;

/// Zoom used when a country is centered without anything to fit.
pub const COUNTRY_DEFAULT_ZOOM: f64 = 6.0;

/// Lowest zoom most raster tile services publish.
pub const MIN_ZOOM: f64 = 0.0;

/// Highest zoom the public OpenStreetMap tile servers publish.
pub const MAX_ZOOM: f64 = 18.0;

/// Pixel padding applied around fitted bounds so markers never touch the edge.
pub const FIT_PADDING_PX: f64 = 50.0;

/// Programmatic +/- zoom step of the overlay controls.
pub const DEFAULT_ZOOM_STEP: i32 = 1;

/// Engine creation attempts before initialization is declared failed.
pub const MAX_INIT_ATTEMPTS: u32 = 3;

/// Marker icon default size (regular PNG).
pub const MARKER_ICON_SIZE: (u32, u32) = (25, 41);

/// Center marker icon size, drawn larger than entity markers.
pub const CENTER_ICON_SIZE: (u32, u32) = (35, 57);

/// Anchor inside the icon (hot-spot) in pixel coords.
pub const MARKER_ICON_ANCHOR: (u32, u32) = (12, 41);

/// Anchor of the larger center icon.
pub const CENTER_ICON_ANCHOR: (u32, u32) = (17, 57);

pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

pub const DEFAULT_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

pub const DEFAULT_STYLESHEET_HREF: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";

pub const DEFAULT_SCRIPT_SRC: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
