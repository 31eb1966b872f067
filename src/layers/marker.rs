//! Marker factory: turns the center and business records into markers.
//!
//! Nothing here talks to an engine. Output order follows input order so
//! popups stay stable between renders and ids can be diffed later.

use crate::{
    constants::{CENTER_ICON_ANCHOR, CENTER_ICON_SIZE, MARKER_ICON_ANCHOR, MARKER_ICON_SIZE},
    core::{
        geo::LatLng,
        model::{CenterInput, CenterKind, EntityInput},
    },
    ui::popup::PopupContent,
};
use serde_json::{Map as JsonMap, Value};

/// Id of the single center marker in every marker set
pub const CENTER_MARKER_ID: &str = "__center__";

/// The validated center of one render cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CenterPoint {
    pub position: LatLng,
    pub label: String,
    pub kind: CenterKind,
    /// Number of businesses associated with the center, mappable or not
    pub subject_count: usize,
}

/// One mappable business
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMarker {
    pub id: String,
    pub position: LatLng,
    pub display_name: String,
    /// Popup content only, never used for placement
    pub attributes: JsonMap<String, Value>,
}

/// Output of [`build_markers`]
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSet {
    pub center_marker: CenterPoint,
    pub entity_markers: Vec<EntityMarker>,
    pub total_entities: usize,
}

impl MarkerSet {
    pub fn mappable_count(&self) -> usize {
        self.entity_markers.len()
    }

    pub fn entity_points(&self) -> Vec<LatLng> {
        self.entity_markers.iter().map(|m| m.position).collect()
    }

    /// Renderable markers, center first
    pub fn render_markers(&self) -> Vec<Marker> {
        std::iter::once(Marker::for_center(&self.center_marker))
            .chain(self.entity_markers.iter().map(Marker::for_entity))
            .collect()
    }
}

/// Builds the marker set for one render cycle.
///
/// `center_position` is the already validated center; invalid centers are
/// reported before this stage. Entities without two finite coordinates are
/// dropped but still counted in `total_entities`.
pub fn build_markers(
    center: &CenterInput,
    center_position: LatLng,
    entities: &[EntityInput],
) -> MarkerSet {
    let entity_markers: Vec<EntityMarker> = entities
        .iter()
        .filter_map(|entity| {
            let position = entity.position()?;
            Some(EntityMarker {
                id: entity.id.clone(),
                position,
                display_name: entity.display_name.clone(),
                attributes: entity.attributes.clone(),
            })
        })
        .collect();

    let skipped = entities.len() - entity_markers.len();
    if skipped > 0 {
        log::debug!(
            "{} of {} entities for '{}' have no usable coordinates",
            skipped,
            entities.len(),
            center.label
        );
    }

    MarkerSet {
        center_marker: CenterPoint {
            position: center_position,
            label: center.label.clone(),
            kind: center.kind,
            subject_count: entities.len(),
        },
        entity_markers,
        total_entities: entities.len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerRole {
    Center,
    Entity,
}

impl std::fmt::Display for MarkerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerRole::Center => write!(f, "center"),
            MarkerRole::Entity => write!(f, "entity"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerIcon {
    pub size: (u32, u32),
    pub anchor: (u32, u32),
    pub color: &'static str,
}

impl MarkerRole {
    pub fn icon(&self) -> MarkerIcon {
        match self {
            MarkerRole::Center => MarkerIcon {
                size: CENTER_ICON_SIZE,
                anchor: CENTER_ICON_ANCHOR,
                color: "red",
            },
            MarkerRole::Entity => MarkerIcon {
                size: MARKER_ICON_SIZE,
                anchor: MARKER_ICON_ANCHOR,
                color: "blue",
            },
        }
    }

    /// Center marker is always drawn above business markers
    pub fn z_index(&self) -> i32 {
        match self {
            MarkerRole::Center => 1000,
            MarkerRole::Entity => 0,
        }
    }
}

/// A marker as handed to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: String,
    pub position: LatLng,
    pub role: MarkerRole,
    pub title: String,
    pub popup: PopupContent,
}

impl Marker {
    pub fn for_center(center: &CenterPoint) -> Self {
        Self {
            id: CENTER_MARKER_ID.to_string(),
            position: center.position,
            role: MarkerRole::Center,
            title: center.label.clone(),
            popup: PopupContent::for_center(center),
        }
    }

    pub fn for_entity(entity: &EntityMarker) -> Self {
        Self {
            id: entity.id.clone(),
            position: entity.position,
            role: MarkerRole::Entity,
            title: entity.display_name.clone(),
            popup: PopupContent::for_entity(entity),
        }
    }

    /// Engine-neutral option bag, for engines configured through JSON
    pub fn options(&self) -> Value {
        let icon = self.role.icon();
        serde_json::json!({
            "id": self.id,
            "role": self.role.to_string(),
            "position": {
                "lat": self.position.lat,
                "lng": self.position.lng
            },
            "title": self.title,
            "zIndexOffset": self.role.z_index(),
            "icon": {
                "size": [icon.size.0, icon.size.1],
                "anchor": [icon.anchor.0, icon.anchor.1],
                "color": icon.color
            },
            "popup": self.popup.to_html()
        })
    }
}
