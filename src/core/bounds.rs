//! Bounds calculator for fitting the viewport around the center and every
//! mappable business.
//!
//! The box is a plain min/max over latitude and longitude. Data sets are city
//! or country sized, so neither the poles nor the antimeridian come into play.

use crate::core::geo::{LatLng, LatLngBounds};
use crate::layers::marker::MarkerSet;

/// Smallest axis-aligned box containing `center` and every entity point.
///
/// With no entity points the box collapses onto the center; callers check
/// [`LatLngBounds::is_degenerate`] before asking an engine to fit it.
pub fn compute_bounds(center: LatLng, entity_points: &[LatLng]) -> LatLngBounds {
    entity_points
        .iter()
        .fold(LatLngBounds::from_point(center), |mut bounds, point| {
            bounds.extend(point);
            bounds
        })
}

/// How the engine should frame a marker set
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportFit {
    /// Fit the box with a fixed pixel padding
    Fit {
        bounds: LatLngBounds,
        padding_px: f64,
    },
    /// Nothing to fit; center on the point at a fixed zoom
    Center { center: LatLng, zoom: f64 },
}

impl ViewportFit {
    pub fn for_markers(markers: &MarkerSet, padding_px: f64, default_zoom: f64) -> Self {
        let center = markers.center_marker.position;
        let points = markers.entity_points();
        if points.is_empty() {
            return Self::Center {
                center,
                zoom: default_zoom,
            };
        }

        let bounds = compute_bounds(center, &points);
        if bounds.is_degenerate() {
            // Every business sits on the center; a zero-area fit is undefined
            Self::Center {
                center,
                zoom: default_zoom,
            }
        } else {
            Self::Fit { bounds, padding_px }
        }
    }
}
