//! Props the map view consumes from the listing, city and country pages.

use crate::core::geo::{LatLng, Point};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};
use std::sync::Arc;

/// Whether the map is centered on a city or a whole country
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterKind {
    #[default]
    City,
    Country,
}

/// The location the map is built around
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterInput {
    pub label: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub kind: CenterKind,
}

impl CenterInput {
    pub fn new(label: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            label: label.into(),
            latitude: Some(latitude),
            longitude: Some(longitude),
            kind: CenterKind::City,
        }
    }

    pub fn with_kind(mut self, kind: CenterKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns the center position or `InvalidCenterCoordinates`
    pub fn validate(&self) -> Result<LatLng> {
        LatLng::from_parts(self.latitude, self.longitude).ok_or_else(|| {
            MapError::InvalidCenterCoordinates {
                label: self.label.clone(),
                latitude: self.latitude,
                longitude: self.longitude,
            }
        })
    }
}

/// One business record as handed over by the listing pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityInput {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub attributes: JsonMap<String, Value>,
}

impl EntityInput {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            latitude,
            longitude,
            attributes: JsonMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Position when both coordinates are present and finite
    pub fn position(&self) -> Option<LatLng> {
        LatLng::from_parts(self.latitude, self.longitude)
    }
}

/// Everything one render of the map view receives
#[derive(Debug, Clone)]
pub struct MapViewProps {
    pub center: CenterInput,
    pub entities: Arc<[EntityInput]>,
    /// CSS length; presentational only
    pub viewport_height: String,
}

impl MapViewProps {
    pub fn new(center: CenterInput, entities: impl Into<Arc<[EntityInput]>>) -> Self {
        Self {
            center,
            entities: entities.into(),
            viewport_height: "400px".to_string(),
        }
    }

    pub fn with_viewport_height(mut self, height: impl Into<String>) -> Self {
        self.viewport_height = height.into();
        self
    }

    /// Identity of the inputs that drive placement: center coordinates,
    /// center label and the entity list reference.
    pub fn same_identity(&self, other: &MapViewProps) -> bool {
        self.center.label == other.center.label
            && same_coord(self.center.latitude, other.center.latitude)
            && same_coord(self.center.longitude, other.center.longitude)
            && Arc::ptr_eq(&self.entities, &other.entities)
    }
}

fn same_coord(a: Option<f64>, b: Option<f64>) -> bool {
    a.map(f64::to_bits) == b.map(f64::to_bits)
}

/// The container element an engine renders into
#[derive(Debug, Clone, PartialEq)]
pub struct MountNode {
    pub id: String,
    pub size: Point,
    pub attached: bool,
}

impl MountNode {
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            size: Point::new(width, height),
            attached: true,
        }
    }

    /// A node that exists but is not yet part of the document
    pub fn detached(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            attached: false,
            ..Self::new(id, width, height)
        }
    }
}
