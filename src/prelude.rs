//! Prelude module for common mapview types and traits
//!
//! Re-exports what a page embedding a map usually needs, for
//! `use mapview::prelude::*;`

pub use crate::core::{
    bounds::{compute_bounds, ViewportFit},
    config::{MapViewConfig, MapViewProfile},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    lifecycle::{BootstrapTicket, EngineLifecycle, LifecyclePhase, MapViewState},
    model::{CenterInput, CenterKind, EntityInput, MapViewProps, MountNode},
};

pub use crate::layers::marker::{build_markers, Marker, MarkerRole, MarkerSet};

pub use crate::bootstrap::{
    BootstrapLoader, BootstrapSource, DocumentHost, HttpBootstrapSource, MemoryDocument,
    ReadySource,
};

pub use crate::engine::{HeadlessEngine, HeadlessModule};

pub use crate::tiles::{TemplateTileSource, TileLoader, TileSource};

pub use crate::traits::{EngineModule, MapEngine};

pub use crate::ui::{Attribution, ErrorPanel, MapControls, MapView, OverlaySnapshot, PopupContent, RetryAction};

pub use crate::{ErrorKind, MapError, Result};

pub use std::sync::Arc;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
