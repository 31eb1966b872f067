//! # mapview
//!
//! A lifecycle-managed interactive map view for business directories.
//!
//! The crate owns the imperative map engine behind an explicit handle,
//! turns a center point plus a list of businesses into markers, frames
//! every mappable point in the viewport, and keeps all of it consistent
//! across mounts, prop changes and unmounts. The rendering engine itself
//! sits behind the [`traits::MapEngine`] boundary.

pub mod bootstrap;
pub mod core;
pub mod engine;
pub mod layers;
pub mod prelude;
pub mod tiles;
pub mod traits;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    bounds::{compute_bounds, ViewportFit},
    config::{MapViewConfig, MapViewProfile},
    geo::{LatLng, LatLngBounds, TileCoord},
    lifecycle::{BootstrapTicket, EngineHandle, EngineLifecycle, LifecyclePhase, MapViewState},
    model::{CenterInput, CenterKind, EntityInput, MapViewProps, MountNode},
};

pub use layers::marker::{build_markers, CenterPoint, EntityMarker, Marker, MarkerRole, MarkerSet};

pub use bootstrap::{BootstrapLoader, BootstrapSource, DocumentHost};

pub use traits::{EngineModule, MapEngine};

pub use ui::{
    controls::{Attribution, MapControls},
    panel::{ErrorPanel, RetryAction},
    popup::PopupContent,
    widget::{MapView, OverlaySnapshot},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Error classes a map view can end up in.
///
/// Cloneable so one shared bootstrap outcome can be handed to every view
/// waiting on it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("Invalid center coordinates for '{label}': latitude {latitude:?}, longitude {longitude:?}")]
    InvalidCenterCoordinates {
        label: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
    },

    #[error("Map engine failed to load: {0}")]
    BootstrapFailure(String),

    #[error("Map engine failed to initialize after {attempts} attempt(s): {reason}")]
    EngineInitializationFailure { attempts: u32, reason: String },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Coarse classification used by the error panel and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidCenter,
    Bootstrap,
    Initialization,
    Engine,
    Config,
    Network,
}

impl MapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCenterCoordinates { .. } => ErrorKind::InvalidCenter,
            Self::BootstrapFailure(_) => ErrorKind::Bootstrap,
            Self::EngineInitializationFailure { .. } => ErrorKind::Initialization,
            Self::Engine(_) => ErrorKind::Engine,
            Self::Config(_) => ErrorKind::Config,
            Self::Network(_) => ErrorKind::Network,
        }
    }

    /// The three subsystem errors surface as a panel with a retry action
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidCenter | ErrorKind::Bootstrap | ErrorKind::Initialization
        )
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<reqwest::Error> for MapError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Error type alias for convenience
pub type Error = MapError;
