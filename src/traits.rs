//! Boundary traits between the map view and the rendering engine.
//!
//! The engine is an imperative, stateful object that knows nothing about the
//! component that owns it. Only the lifecycle manager holds one, through an
//! [`EngineHandle`](crate::core::lifecycle::EngineHandle).

use crate::{
    core::{
        geo::{LatLng, LatLngBounds, Point},
        model::MountNode,
    },
    layers::marker::Marker,
    Result,
};

/// The loaded engine library, as returned by the bootstrap loader.
///
/// Shared process-wide, so it must be cheap to hand out and thread safe.
pub trait EngineModule: Send + Sync {
    /// Library name, for logging
    fn name(&self) -> &str;

    /// Creates an engine bound to `mount`, showing `center` at `zoom`.
    ///
    /// Fails with `EngineInitializationFailure` when the node cannot be
    /// attached to (for example, it is not yet in the document).
    fn create(&self, mount: &MountNode, center: LatLng, zoom: f64) -> Result<Box<dyn MapEngine>>;
}

/// One live engine instance rendering into one mount node
pub trait MapEngine {
    /// Centers the view on `center` at `zoom`
    fn set_view(&mut self, center: LatLng, zoom: f64) -> Result<()>;

    /// Fits `bounds` into the view, keeping `padding_px` screen pixels free on every side
    fn fit_bounds(&mut self, bounds: &LatLngBounds, padding_px: f64) -> Result<()>;

    fn add_marker(&mut self, marker: &Marker) -> Result<()>;

    /// Removes every marker and its popup
    fn clear_markers(&mut self);

    fn center(&self) -> LatLng;

    fn zoom(&self) -> f64;

    /// Supported zoom range as `(min, max)`
    fn zoom_range(&self) -> (f64, f64);

    /// Adopts the container's final on-screen size once layout has settled
    fn invalidate_size(&mut self, size: Point);

    /// Releases markers, popups, listeners and the DOM the engine created.
    /// Calling it twice must be harmless.
    fn destroy(&mut self);

    /// Dynamic casting support
    fn as_any(&self) -> &dyn std::any::Any;
}
