//! Marker layout for the spam map.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};

use crate::model::Model;

/// Initial viewport, roughly centred on South Asia.
pub const DEFAULT_MAP_CENTER: (f64, f64) = (20.0, 77.0);
pub const DEFAULT_MAP_ZOOM: u8 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Visitor,
    Flagged,
}

impl MarkerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerKind::Visitor => "visitor",
            MarkerKind::Flagged => "flagged",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub kind: MarkerKind,
    pub lat: f64,
    pub lng: f64,
    pub popup: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
}

impl MapView {
    /// Visitor marker first (if any), then flagged entries in insertion order.
    pub fn from_model(model: &Model) -> Self {
        let mut markers = Vec::with_capacity(model.flagged.len() + 1);

        if let Some(location) = &model.location {
            markers.push(MapMarker {
                kind: MarkerKind::Visitor,
                lat: location.lat,
                lng: location.lng,
                popup: location.label(),
            });
        }

        markers.extend(model.flagged.iter().map(|entry| MapMarker {
            kind: MarkerKind::Flagged,
            lat: entry.lat,
            lng: entry.lng,
            popup: entry.message.clone(),
        }));

        Self {
            center_lat: DEFAULT_MAP_CENTER.0,
            center_lng: DEFAULT_MAP_CENTER.1,
            zoom: DEFAULT_MAP_ZOOM,
            markers,
        }
    }

    pub fn flagged_count(&self) -> usize {
        self.markers
            .iter()
            .filter(|m| m.kind == MarkerKind::Flagged)
            .count()
    }

    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .markers
            .iter()
            .map(|marker| {
                let mut properties = JsonObject::new();
                properties.insert("kind".to_string(), marker.kind.as_str().into());
                properties.insert("popup".to_string(), marker.popup.clone().into());

                Feature {
                    bbox: None,
                    // GeoJSON positions are [longitude, latitude].
                    geometry: Some(Geometry::new(Value::Point(vec![marker.lng, marker.lat]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}
